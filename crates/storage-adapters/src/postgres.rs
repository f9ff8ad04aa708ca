//! # PostgreSQL store
//!
//! Maps the relational schema in `sql/schema.sql` onto the domain rows.
//! Every listing is a keyset query: `uid < $since ORDER BY uid DESC` for
//! `Next`, `uid > $since ORDER BY uid ASC` for `Prev`. Batched lookups take
//! the whole uid list at once through `= ANY($1)`.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use domains::{
    AccessOracle, BoardBasic, BoardConfig, BoardRepo, BoardType, CategoryRef, Comparator,
    CommentRepo, CommentRow, Exif, FileRow, Hashtag, ImageRow, LevelThresholds, PageWindow,
    PointCosts, PostFilter, PostRepo, PostRow, SecretScope, SortOrder, Status, TextField,
    Thumbnail, Uid, UserRepo, Writer,
};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;

const SCHEMA: &str = include_str!("../sql/schema.sql");

const POST_COLUMNS: &str = "p.uid, p.board_uid, p.user_uid, p.category_uid, p.title, p.content, \
                            p.submitted, p.modified, p.hit, p.status";

const COMMENT_COLUMNS: &str = "c.uid, c.reply_uid, c.post_uid, c.board_uid, c.user_uid, \
                               c.content, c.submitted, c.modified, c.status";

const BOARD_COLUMNS: &str = "uid, id, group_uid, admin_uid, type, name, info, row_count, width, \
                             use_category, level_list, level_view, level_write, \
                             level_comment, level_download, point_view, point_write, \
                             point_comment, point_download";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

// Uids are BIGSERIAL; negative values never occur in practice.
fn to_uid(value: i64) -> Uid {
    Uid::try_from(value).unwrap_or_default()
}

fn to_db(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn to_db_all(values: &[Uid]) -> Vec<i64> {
    values.iter().copied().map(to_db).collect()
}

fn to_u32(value: i32) -> u32 {
    u32::try_from(value).unwrap_or_default()
}

/// Unknown status codes are treated as removed so they never surface.
fn to_status(code: i16) -> Status {
    i8::try_from(code)
        .ok()
        .and_then(Status::from_code)
        .unwrap_or(Status::Removed)
}

/// `%keyword%` with LIKE metacharacters escaped.
fn like_pattern(keyword: &str) -> String {
    let mut pattern = String::with_capacity(keyword.len() + 2);
    pattern.push('%');
    for ch in keyword.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

/// Comparison operator and sort order for a keyset window.
fn keyset(window: &PageWindow) -> (&'static str, &'static str) {
    let op = match window.cursor.direction.comparator() {
        Comparator::Less => "<",
        Comparator::Greater => ">",
    };
    let order = match window.cursor.direction.order() {
        SortOrder::Descending => "DESC",
        SortOrder::Ascending => "ASC",
    };
    (op, order)
}

fn post_row(row: &PgRow) -> Result<PostRow, sqlx::Error> {
    Ok(PostRow {
        uid: to_uid(row.try_get("uid")?),
        board_uid: to_uid(row.try_get("board_uid")?),
        writer_uid: to_uid(row.try_get("user_uid")?),
        category_uid: to_uid(row.try_get("category_uid")?),
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        submitted: to_uid(row.try_get("submitted")?),
        modified: to_uid(row.try_get("modified")?),
        hit: to_uid(row.try_get("hit")?),
        status: to_status(row.try_get("status")?),
    })
}

fn comment_row(row: &PgRow) -> Result<CommentRow, sqlx::Error> {
    Ok(CommentRow {
        uid: to_uid(row.try_get("uid")?),
        reply_uid: to_uid(row.try_get("reply_uid")?),
        post_uid: to_uid(row.try_get("post_uid")?),
        board_uid: to_uid(row.try_get("board_uid")?),
        writer_uid: to_uid(row.try_get("user_uid")?),
        content: row.try_get("content")?,
        submitted: to_uid(row.try_get("submitted")?),
        modified: to_uid(row.try_get("modified")?),
        status: to_status(row.try_get("status")?),
    })
}

fn board_config(row: &PgRow) -> Result<BoardConfig, sqlx::Error> {
    let board_type: i16 = row.try_get("type")?;
    Ok(BoardConfig {
        uid: to_uid(row.try_get("uid")?),
        id: row.try_get("id")?,
        group_uid: to_uid(row.try_get("group_uid")?),
        admin_uid: to_uid(row.try_get("admin_uid")?),
        board_type: BoardType::from_code(u8::try_from(board_type).unwrap_or_default()),
        name: row.try_get("name")?,
        info: row.try_get("info")?,
        row_count: to_u32(row.try_get("row_count")?),
        width: to_u32(row.try_get("width")?),
        use_category: row.try_get("use_category")?,
        categories: Vec::new(),
        level: LevelThresholds {
            list: to_u32(row.try_get("level_list")?),
            view: to_u32(row.try_get("level_view")?),
            write: to_u32(row.try_get("level_write")?),
            comment: to_u32(row.try_get("level_comment")?),
            download: to_u32(row.try_get("level_download")?),
        },
        point: PointCosts {
            view: row.try_get("point_view")?,
            write: row.try_get("point_write")?,
            comment: row.try_get("point_comment")?,
            download: row.try_get("point_download")?,
        },
    })
}

fn count_map(rows: &[PgRow]) -> Result<HashMap<Uid, u64>, sqlx::Error> {
    rows.iter()
        .map(|row| Ok((to_uid(row.try_get("uid")?), to_uid(row.try_get("total")?))))
        .collect()
}

/// The single bound value a [`PostFilter`] contributes, if any.
enum FilterArg {
    None,
    Text(String),
    Uid(i64),
    Uids(Vec<i64>),
}

fn filter_clause(filter: &PostFilter) -> (&'static str, FilterArg) {
    match filter {
        PostFilter::Window => ("", FilterArg::None),
        PostFilter::Text(TextField::Title, keyword) => (
            "AND p.title LIKE $5 ESCAPE '\\'",
            FilterArg::Text(like_pattern(keyword)),
        ),
        PostFilter::Text(TextField::Content, keyword) => (
            "AND p.content LIKE $5 ESCAPE '\\'",
            FilterArg::Text(like_pattern(keyword)),
        ),
        PostFilter::Writer(writer_uid) => {
            ("AND p.user_uid = $5", FilterArg::Uid(to_db(*writer_uid)))
        }
        PostFilter::Tags(tag_uids) => (
            "AND EXISTS (SELECT 1 FROM post_hashtags h \
             WHERE h.post_uid = p.uid AND h.hashtag_uid = ANY($5))",
            FilterArg::Uids(to_db_all(tag_uids)),
        ),
        PostFilter::ImageDescription(keyword) => (
            "AND EXISTS (SELECT 1 FROM post_images i \
             JOIN image_descriptions d ON d.file_uid = i.file_uid \
             WHERE i.post_uid = p.uid AND d.description LIKE $5 ESCAPE '\\')",
            FilterArg::Text(like_pattern(keyword)),
        ),
    }
}

/// Appended after a content or image-description filter, which binds `$5`.
const SECRET_SCOPE_CLAUSE: &str = "AND (p.status <> 2 OR $6 OR p.user_uid = $7)";

fn narrows_secrets(filter: &PostFilter) -> bool {
    matches!(filter, PostFilter::Text(TextField::Content, _) | PostFilter::ImageDescription(_))
}

/// `(every secret post, the viewer's own uid)`; -1 matches no writer.
fn scope_args(scope: SecretScope) -> (bool, i64) {
    match scope {
        SecretScope::All => (true, -1),
        SecretScope::Writer(uid) if uid > 0 => (false, to_db(uid)),
        _ => (false, -1),
    }
}

impl PgStore {
    pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates missing tables and indexes. Idempotent.
    pub async fn install_schema(&self) -> anyhow::Result<()> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    async fn categories(&self, board_uid: Uid) -> anyhow::Result<Vec<CategoryRef>> {
        let rows = sqlx::query(
            "SELECT uid, name FROM board_categories WHERE board_uid = $1 ORDER BY uid",
        )
        .bind(to_db(board_uid))
        .fetch_all(&self.pool)
        .await?;
        rows.iter()
            .map(|row| {
                Ok(CategoryRef { uid: to_uid(row.try_get("uid")?), name: row.try_get("name")? })
            })
            .collect()
    }
}

#[async_trait]
impl BoardRepo for PgStore {
    async fn board_uid_by_id(&self, id: &str) -> anyhow::Result<Option<Uid>> {
        let uid: Option<i64> = sqlx::query_scalar("SELECT uid FROM boards WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(uid.map(to_uid))
    }

    async fn board_config(&self, board_uid: Uid) -> anyhow::Result<Option<BoardConfig>> {
        let sql = format!("SELECT {BOARD_COLUMNS} FROM boards WHERE uid = $1");
        let Some(row) = sqlx::query(&sql)
            .bind(to_db(board_uid))
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };
        let mut config = board_config(&row)?;
        if config.use_category {
            config.categories = self.categories(board_uid).await?;
        }
        Ok(Some(config))
    }

    async fn board_basics(&self, board_uids: &[Uid]) -> anyhow::Result<HashMap<Uid, BoardBasic>> {
        let rows = sqlx::query("SELECT uid, id, name, type FROM boards WHERE uid = ANY($1)")
            .bind(to_db_all(board_uids))
            .fetch_all(&self.pool)
            .await?;
        let mut boards = HashMap::with_capacity(rows.len());
        for row in rows {
            let uid = to_uid(row.try_get("uid")?);
            let board_type: i16 = row.try_get("type")?;
            boards.insert(
                uid,
                BoardBasic {
                    uid,
                    id: row.try_get("id")?,
                    name: row.try_get("name")?,
                    board_type: BoardType::from_code(u8::try_from(board_type).unwrap_or_default()),
                },
            );
        }
        Ok(boards)
    }

    async fn category_names(&self, category_uids: &[Uid]) -> anyhow::Result<HashMap<Uid, String>> {
        let rows = sqlx::query("SELECT uid, name FROM board_categories WHERE uid = ANY($1)")
            .bind(to_db_all(category_uids))
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| Ok((to_uid(row.try_get("uid")?), row.try_get("name")?)))
            .collect()
    }
}

#[async_trait]
impl UserRepo for PgStore {
    async fn writers(&self, user_uids: &[Uid]) -> anyhow::Result<HashMap<Uid, Writer>> {
        let rows =
            sqlx::query("SELECT uid, name, profile, signature FROM users WHERE uid = ANY($1)")
                .bind(to_db_all(user_uids))
                .fetch_all(&self.pool)
                .await?;
        let mut writers = HashMap::with_capacity(rows.len());
        for row in rows {
            let uid = to_uid(row.try_get("uid")?);
            writers.insert(
                uid,
                Writer {
                    uid,
                    name: row.try_get("name")?,
                    profile: row.try_get("profile")?,
                    signature: row.try_get("signature")?,
                },
            );
        }
        Ok(writers)
    }

    async fn writer_uid_by_name(&self, name: &str) -> anyhow::Result<Option<Uid>> {
        let uid: Option<i64> = sqlx::query_scalar(
            "SELECT uid FROM users WHERE name LIKE $1 ESCAPE '\\' \
             ORDER BY signup DESC, uid DESC LIMIT 1",
        )
        .bind(like_pattern(name))
        .fetch_optional(&self.pool)
        .await?;
        Ok(uid.map(to_uid))
    }

    async fn black_list(&self, user_uid: Uid) -> anyhow::Result<Vec<Uid>> {
        let uids: Vec<i64> = sqlx::query_scalar(
            "SELECT black_uid FROM user_black_list WHERE user_uid = $1 ORDER BY black_uid",
        )
        .bind(to_db(user_uid))
        .fetch_all(&self.pool)
        .await?;
        Ok(uids.into_iter().map(to_uid).collect())
    }
}

#[async_trait]
impl PostRepo for PgStore {
    async fn max_uid(&self) -> anyhow::Result<Uid> {
        let max: Option<i64> = sqlx::query_scalar("SELECT MAX(uid) FROM posts")
            .fetch_one(&self.pool)
            .await?;
        Ok(max.map(to_uid).unwrap_or_default())
    }

    async fn total_count(&self, board_uid: Uid) -> anyhow::Result<u64> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE board_uid = $1 AND status != -1")
                .bind(to_db(board_uid))
                .fetch_one(&self.pool)
                .await?;
        Ok(to_uid(total))
    }

    async fn notices(&self, board_uid: Uid) -> anyhow::Result<Vec<PostRow>> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts p WHERE p.board_uid = $1 AND p.status = 1 \
             ORDER BY p.uid DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(to_db(board_uid))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(post_row).collect::<Result<_, _>>()?)
    }

    async fn find(
        &self,
        board_uid: Uid,
        filter: &PostFilter,
        scope: SecretScope,
        window: PageWindow,
    ) -> anyhow::Result<Vec<PostRow>> {
        let (op, order) = keyset(&window);
        let (clause, arg) = filter_clause(filter);
        let secret = if narrows_secrets(filter) { SECRET_SCOPE_CLAUSE } else { "" };
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts p \
             WHERE p.board_uid = $1 AND p.status IN (0, 2) AND p.uid {op} $2 {clause} {secret} \
             ORDER BY p.uid {order} LIMIT $3 OFFSET $4"
        );
        tracing::debug!(board_uid, ?filter, "post window query");
        let query = sqlx::query(&sql)
            .bind(to_db(board_uid))
            .bind(to_db(window.cursor.since_uid))
            .bind(to_db(window.limit))
            .bind(to_db(window.offset));
        let query = match arg {
            FilterArg::None => query,
            FilterArg::Text(text) => query.bind(text),
            FilterArg::Uid(uid) => query.bind(uid),
            FilterArg::Uids(uids) => query.bind(uids),
        };
        let query = if secret.is_empty() {
            query
        } else {
            let (all, writer_uid) = scope_args(scope);
            query.bind(all).bind(writer_uid)
        };
        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.iter().map(post_row).collect::<Result<_, _>>()?)
    }

    async fn latest(&self, board_uid: Uid, window: PageWindow) -> anyhow::Result<Vec<PostRow>> {
        let (op, order) = keyset(&window);
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts p \
             WHERE p.status = 0 AND ($1 = 0 OR p.board_uid = $1) AND p.uid {op} $2 \
             ORDER BY p.uid {order} LIMIT $3 OFFSET $4"
        );
        let rows = sqlx::query(&sql)
            .bind(to_db(board_uid))
            .bind(to_db(window.cursor.since_uid))
            .bind(to_db(window.limit))
            .bind(to_db(window.offset))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(post_row).collect::<Result<_, _>>()?)
    }

    async fn hashtag_uid(&self, name: &str) -> anyhow::Result<Option<Uid>> {
        let uid: Option<i64> = sqlx::query_scalar("SELECT uid FROM hashtags WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(uid.map(to_uid))
    }

    async fn post(&self, post_uid: Uid) -> anyhow::Result<Option<PostRow>> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts p WHERE p.uid = $1");
        let row = sqlx::query(&sql)
            .bind(to_db(post_uid))
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(post_row).transpose()?)
    }

    async fn prev_uid(&self, board_uid: Uid, post_uid: Uid) -> anyhow::Result<Uid> {
        let uid: Option<i64> = sqlx::query_scalar(
            "SELECT MAX(uid) FROM posts WHERE board_uid = $1 AND status != -1 AND uid < $2",
        )
        .bind(to_db(board_uid))
        .bind(to_db(post_uid))
        .fetch_one(&self.pool)
        .await?;
        Ok(uid.map(to_uid).unwrap_or_default())
    }

    async fn next_uid(&self, board_uid: Uid, post_uid: Uid) -> anyhow::Result<Uid> {
        let uid: Option<i64> = sqlx::query_scalar(
            "SELECT MIN(uid) FROM posts WHERE board_uid = $1 AND status != -1 AND uid > $2",
        )
        .bind(to_db(board_uid))
        .bind(to_db(post_uid))
        .fetch_one(&self.pool)
        .await?;
        Ok(uid.map(to_uid).unwrap_or_default())
    }

    async fn increment_hit(&self, post_uid: Uid) -> anyhow::Result<()> {
        sqlx::query("UPDATE posts SET hit = hit + 1 WHERE uid = $1")
            .bind(to_db(post_uid))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn attachments(&self, post_uid: Uid) -> anyhow::Result<Vec<FileRow>> {
        let rows = sqlx::query(
            "SELECT f.uid, f.post_uid, f.name, f.path FROM files f \
             WHERE f.post_uid = $1 \
             AND NOT EXISTS (SELECT 1 FROM post_images i WHERE i.file_uid = f.uid) \
             ORDER BY f.uid",
        )
        .bind(to_db(post_uid))
        .fetch_all(&self.pool)
        .await?;
        rows.iter()
            .map(|row| {
                Ok(FileRow {
                    uid: to_uid(row.try_get("uid")?),
                    post_uid: to_uid(row.try_get("post_uid")?),
                    name: row.try_get("name")?,
                    path: row.try_get("path")?,
                })
            })
            .collect()
    }

    async fn images(&self, post_uid: Uid) -> anyhow::Result<Vec<ImageRow>> {
        let rows = sqlx::query(
            "SELECT uid, file_uid, post_uid, path FROM post_images \
             WHERE post_uid = $1 ORDER BY uid",
        )
        .bind(to_db(post_uid))
        .fetch_all(&self.pool)
        .await?;
        rows.iter()
            .map(|row| {
                Ok(ImageRow {
                    uid: to_uid(row.try_get("uid")?),
                    file_uid: to_uid(row.try_get("file_uid")?),
                    post_uid: to_uid(row.try_get("post_uid")?),
                    path: row.try_get("path")?,
                })
            })
            .collect()
    }

    async fn thumbnail(&self, file_uid: Uid) -> anyhow::Result<Option<Thumbnail>> {
        let row = sqlx::query("SELECT small, large FROM file_thumbnails WHERE file_uid = $1")
            .bind(to_db(file_uid))
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(Thumbnail { small: row.try_get("small")?, large: row.try_get("large")? }))
    }

    async fn exif(&self, file_uid: Uid) -> anyhow::Result<Option<Exif>> {
        let row = sqlx::query(
            "SELECT make, model, aperture, iso, focal_length, exposure, width, height, date \
             FROM exif WHERE file_uid = $1",
        )
        .bind(to_db(file_uid))
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(Exif {
            make: row.try_get("make")?,
            model: row.try_get("model")?,
            aperture: to_u32(row.try_get("aperture")?),
            iso: to_u32(row.try_get("iso")?),
            focal_length: to_u32(row.try_get("focal_length")?),
            exposure: to_u32(row.try_get("exposure")?),
            width: to_u32(row.try_get("width")?),
            height: to_u32(row.try_get("height")?),
            date: to_uid(row.try_get("date")?),
        }))
    }

    async fn image_description(&self, file_uid: Uid) -> anyhow::Result<Option<String>> {
        let description: Option<String> =
            sqlx::query_scalar("SELECT description FROM image_descriptions WHERE file_uid = $1")
                .bind(to_db(file_uid))
                .fetch_optional(&self.pool)
                .await?;
        Ok(description)
    }

    async fn tags(&self, post_uid: Uid) -> anyhow::Result<Vec<Hashtag>> {
        let rows = sqlx::query(
            "SELECT h.uid, h.name FROM hashtags h \
             JOIN post_hashtags ph ON ph.hashtag_uid = h.uid \
             WHERE ph.post_uid = $1 ORDER BY h.uid",
        )
        .bind(to_db(post_uid))
        .fetch_all(&self.pool)
        .await?;
        rows.iter()
            .map(|row| Ok(Hashtag { uid: to_uid(row.try_get("uid")?), name: row.try_get("name")? }))
            .collect()
    }

    async fn latest_by_writer(&self, writer_uid: Uid, limit: u64) -> anyhow::Result<Vec<PostRow>> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts p WHERE p.user_uid = $1 AND p.status != -1 \
             ORDER BY p.uid DESC LIMIT $2"
        );
        let rows = sqlx::query(&sql)
            .bind(to_db(writer_uid))
            .bind(to_db(limit))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(post_row).collect::<Result<_, _>>()?)
    }

    async fn cover_paths(&self, post_uids: &[Uid]) -> anyhow::Result<HashMap<Uid, String>> {
        let rows = sqlx::query(
            "SELECT DISTINCT ON (i.post_uid) i.post_uid AS uid, t.small FROM post_images i \
             JOIN file_thumbnails t ON t.file_uid = i.file_uid \
             WHERE i.post_uid = ANY($1) ORDER BY i.post_uid, i.uid",
        )
        .bind(to_db_all(post_uids))
        .fetch_all(&self.pool)
        .await?;
        rows.iter()
            .map(|row| Ok((to_uid(row.try_get("uid")?), row.try_get("small")?)))
            .collect()
    }

    async fn comment_counts(&self, post_uids: &[Uid]) -> anyhow::Result<HashMap<Uid, u64>> {
        let rows = sqlx::query(
            "SELECT post_uid AS uid, COUNT(*) AS total FROM comments \
             WHERE post_uid = ANY($1) AND status != -1 GROUP BY post_uid",
        )
        .bind(to_db_all(post_uids))
        .fetch_all(&self.pool)
        .await?;
        Ok(count_map(&rows)?)
    }

    async fn like_counts(&self, post_uids: &[Uid]) -> anyhow::Result<HashMap<Uid, u64>> {
        let rows = sqlx::query(
            "SELECT post_uid AS uid, COUNT(*) AS total FROM post_likes \
             WHERE post_uid = ANY($1) AND liked GROUP BY post_uid",
        )
        .bind(to_db_all(post_uids))
        .fetch_all(&self.pool)
        .await?;
        Ok(count_map(&rows)?)
    }

    async fn liked_by(&self, post_uids: &[Uid], user_uid: Uid) -> anyhow::Result<HashSet<Uid>> {
        let uids: Vec<i64> = sqlx::query_scalar(
            "SELECT post_uid FROM post_likes WHERE post_uid = ANY($1) AND user_uid = $2 AND liked",
        )
        .bind(to_db_all(post_uids))
        .bind(to_db(user_uid))
        .fetch_all(&self.pool)
        .await?;
        Ok(uids.into_iter().map(to_uid).collect())
    }
}

#[async_trait]
impl CommentRepo for PgStore {
    async fn max_uid(&self) -> anyhow::Result<Uid> {
        let max: Option<i64> = sqlx::query_scalar("SELECT MAX(uid) FROM comments")
            .fetch_one(&self.pool)
            .await?;
        Ok(max.map(to_uid).unwrap_or_default())
    }

    async fn total_count(&self, post_uid: Uid) -> anyhow::Result<u64> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE post_uid = $1 AND status != -1")
                .bind(to_db(post_uid))
                .fetch_one(&self.pool)
                .await?;
        Ok(to_uid(total))
    }

    async fn thread(&self, post_uid: Uid, window: PageWindow) -> anyhow::Result<Vec<CommentRow>> {
        let (op, order) = keyset(&window);
        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments c \
             WHERE c.post_uid = $1 AND c.status != -1 AND c.uid {op} $2 \
             ORDER BY c.reply_uid ASC, c.uid {order} LIMIT $3 OFFSET $4"
        );
        let rows = sqlx::query(&sql)
            .bind(to_db(post_uid))
            .bind(to_db(window.cursor.since_uid))
            .bind(to_db(window.limit))
            .bind(to_db(window.offset))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(comment_row).collect::<Result<_, _>>()?)
    }

    async fn latest_by_writer(
        &self,
        writer_uid: Uid,
        limit: u64,
    ) -> anyhow::Result<Vec<CommentRow>> {
        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments c WHERE c.user_uid = $1 AND c.status != -1 \
             ORDER BY c.uid DESC LIMIT $2"
        );
        let rows = sqlx::query(&sql)
            .bind(to_db(writer_uid))
            .bind(to_db(limit))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(comment_row).collect::<Result<_, _>>()?)
    }

    async fn like_counts(&self, comment_uids: &[Uid]) -> anyhow::Result<HashMap<Uid, u64>> {
        let rows = sqlx::query(
            "SELECT comment_uid AS uid, COUNT(*) AS total FROM comment_likes \
             WHERE comment_uid = ANY($1) AND liked GROUP BY comment_uid",
        )
        .bind(to_db_all(comment_uids))
        .fetch_all(&self.pool)
        .await?;
        Ok(count_map(&rows)?)
    }

    async fn liked_by(&self, comment_uids: &[Uid], user_uid: Uid) -> anyhow::Result<HashSet<Uid>> {
        let uids: Vec<i64> = sqlx::query_scalar(
            "SELECT comment_uid FROM comment_likes \
             WHERE comment_uid = ANY($1) AND user_uid = $2 AND liked",
        )
        .bind(to_db_all(comment_uids))
        .bind(to_db(user_uid))
        .fetch_all(&self.pool)
        .await?;
        Ok(uids.into_iter().map(to_uid).collect())
    }
}

#[async_trait]
impl AccessOracle for PgStore {
    async fn is_site_admin(&self, user_uid: Uid) -> anyhow::Result<bool> {
        let root: Option<bool> = sqlx::query_scalar("SELECT is_root FROM users WHERE uid = $1")
            .bind(to_db(user_uid))
            .fetch_optional(&self.pool)
            .await?;
        Ok(root.unwrap_or(false))
    }

    async fn is_group_admin(&self, group_uid: Uid, user_uid: Uid) -> anyhow::Result<bool> {
        let admin: Option<i64> = sqlx::query_scalar("SELECT admin_uid FROM groups WHERE uid = $1")
            .bind(to_db(group_uid))
            .fetch_optional(&self.pool)
            .await?;
        Ok(admin.is_some_and(|admin| to_uid(admin) == user_uid))
    }

    async fn level_and_point(&self, user_uid: Uid) -> anyhow::Result<(u32, i64)> {
        let row = sqlx::query("SELECT level, point FROM users WHERE uid = $1")
            .bind(to_db(user_uid))
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok((0, 0));
        };
        Ok((to_u32(row.try_get("level")?), row.try_get("point")?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{Cursor, Direction};

    #[test]
    fn like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("plain"), "%plain%");
    }

    #[test]
    fn keyset_follows_direction() {
        let next = PageWindow::new(Cursor::new(10, Direction::Next), 0, 5);
        let prev = PageWindow::new(Cursor::new(10, Direction::Prev), 0, 5);
        assert_eq!(keyset(&next), ("<", "DESC"));
        assert_eq!(keyset(&prev), (">", "ASC"));
    }

    #[test]
    fn unknown_status_hides_the_row() {
        assert_eq!(to_status(2), Status::Secret);
        assert_eq!(to_status(9), Status::Removed);
    }

    #[test]
    fn tag_filter_binds_uid_array() {
        let (clause, arg) = filter_clause(&PostFilter::Tags(vec![3, 4]));
        assert!(clause.contains("ANY($5)"));
        assert!(matches!(arg, FilterArg::Uids(ref uids) if uids == &vec![3, 4]));
    }

    #[test]
    fn only_body_searches_narrow_secret_posts() {
        let content = PostFilter::Text(TextField::Content, "x".into());
        let title = PostFilter::Text(TextField::Title, "x".into());
        assert!(narrows_secrets(&content));
        assert!(narrows_secrets(&PostFilter::ImageDescription("x".into())));
        assert!(!narrows_secrets(&title));
        assert_eq!(scope_args(SecretScope::None), (false, -1));
        assert_eq!(scope_args(SecretScope::Writer(0)), (false, -1));
        assert_eq!(scope_args(SecretScope::Writer(8)), (false, 8));
        assert_eq!(scope_args(SecretScope::All), (true, -1));
    }
}
