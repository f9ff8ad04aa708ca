//! # In-memory store
//!
//! A complete implementation of every port over `DashMap` tables. Used by
//! the integration tests and for demos; semantics match the PostgreSQL
//! store (status filters, keyset windows, batched lookups).

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use domains::{
    AccessOracle, BoardBasic, BoardConfig, BoardRepo, Category, CategoryRef, CommentRepo,
    CommentRow, Cursor, Exif, FileResolver, FileRow, Hashtag, ImageRow, LikeRecord, PageWindow,
    PostFilter, PostRepo, PostRow, SecretScope, Status, TextField, Thumbnail, Uid, UserRepo, Writer,
};

/// A registered user with the fields the engine reads.
#[derive(Debug, Clone, Default)]
pub struct UserRecord {
    pub writer: Writer,
    pub level: u32,
    pub point: i64,
    pub signup: u64,
    pub site_admin: bool,
    pub black_list: Vec<Uid>,
}

/// An attached image and its optional sub-rows.
#[derive(Debug, Clone, Default)]
pub struct NewImage {
    pub path: String,
    pub thumbnail: Option<Thumbnail>,
    pub exif: Option<Exif>,
    pub description: Option<String>,
}

pub fn now_millis() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default()
}

#[derive(Default)]
pub struct MemoryStore {
    seq: AtomicU64,
    boards: DashMap<Uid, BoardConfig>,
    categories: DashMap<Uid, Category>,
    group_admins: DashMap<Uid, Uid>,
    users: DashMap<Uid, UserRecord>,
    posts: DashMap<Uid, PostRow>,
    comments: DashMap<Uid, CommentRow>,
    post_likes: DashMap<(Uid, Uid), LikeRecord>,
    comment_likes: DashMap<(Uid, Uid), LikeRecord>,
    hashtags: DashMap<Uid, Hashtag>,
    post_tags: DashMap<Uid, Vec<Uid>>,
    files: DashMap<Uid, FileRow>,
    file_sizes: DashMap<String, u64>,
    images: DashMap<Uid, ImageRow>,
    thumbnails: DashMap<Uid, Thumbnail>,
    exifs: DashMap<Uid, Exif>,
    descriptions: DashMap<Uid, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// One shared sequence, so uids are unique across tables and boards.
    fn next_uid(&self) -> Uid {
        self.seq.fetch_add(1, Ordering::Relaxed) + 1
    }

    // ── Seeding ─────────────────────────────────────────────────────────────

    /// Stores the board under `config.uid`, or a fresh uid when it is 0.
    pub fn insert_board(&self, mut config: BoardConfig) -> Uid {
        if config.uid == 0 {
            config.uid = self.next_uid();
        }
        let uid = config.uid;
        self.boards.insert(uid, config);
        uid
    }

    pub fn insert_category(&self, board_uid: Uid, name: &str) -> Uid {
        let uid = self.next_uid();
        self.categories.insert(uid, Category { uid, board_uid, name: name.to_string() });
        if let Some(mut board) = self.boards.get_mut(&board_uid) {
            board.use_category = true;
        }
        uid
    }

    pub fn insert_user(&self, name: &str, level: u32, point: i64) -> Uid {
        let uid = self.next_uid();
        let writer = Writer { uid, name: name.to_string(), ..Default::default() };
        let record = UserRecord { writer, level, point, signup: uid, ..Default::default() };
        self.users.insert(uid, record);
        uid
    }

    pub fn set_site_admin(&self, user_uid: Uid) {
        if let Some(mut user) = self.users.get_mut(&user_uid) {
            user.site_admin = true;
        }
    }

    pub fn set_group_admin(&self, group_uid: Uid, user_uid: Uid) {
        self.group_admins.insert(group_uid, user_uid);
    }

    pub fn block(&self, user_uid: Uid, blocked_uid: Uid) {
        if let Some(mut user) = self.users.get_mut(&user_uid) {
            user.black_list.push(blocked_uid);
        }
    }

    /// Assigns a fresh uid; a zero `submitted` is stamped with the clock.
    pub fn insert_post(&self, mut post: PostRow) -> Uid {
        post.uid = self.next_uid();
        if post.submitted == 0 {
            post.submitted = now_millis();
        }
        let uid = post.uid;
        self.posts.insert(uid, post);
        uid
    }

    pub fn set_post_status(&self, post_uid: Uid, status: Status) {
        if let Some(mut post) = self.posts.get_mut(&post_uid) {
            post.status = status;
        }
    }

    pub fn insert_comment(&self, mut comment: CommentRow) -> Uid {
        comment.uid = self.next_uid();
        if comment.submitted == 0 {
            comment.submitted = now_millis();
        }
        if let Some(post) = self.posts.get(&comment.post_uid) {
            comment.board_uid = post.board_uid;
        }
        let uid = comment.uid;
        self.comments.insert(uid, comment);
        uid
    }

    pub fn set_comment_status(&self, comment_uid: Uid, status: Status) {
        if let Some(mut comment) = self.comments.get_mut(&comment_uid) {
            comment.status = status;
        }
    }

    /// Likes or unlikes; unliking keeps the row with `liked = false`.
    pub fn like_post(&self, post_uid: Uid, user_uid: Uid, liked: bool) {
        let board_uid = self.posts.get(&post_uid).map(|p| p.board_uid).unwrap_or_default();
        self.post_likes.insert(
            (post_uid, user_uid),
            LikeRecord {
                board_uid,
                target_uid: post_uid,
                user_uid,
                liked,
                timestamp: now_millis(),
            },
        );
    }

    pub fn like_comment(&self, comment_uid: Uid, user_uid: Uid, liked: bool) {
        let board_uid = self.comments.get(&comment_uid).map(|c| c.board_uid).unwrap_or_default();
        self.comment_likes.insert(
            (comment_uid, user_uid),
            LikeRecord {
                board_uid,
                target_uid: comment_uid,
                user_uid,
                liked,
                timestamp: now_millis(),
            },
        );
    }

    /// Tags a post, creating the hashtag on first use.
    pub fn tag_post(&self, post_uid: Uid, name: &str) -> Uid {
        let existing = self
            .hashtags
            .iter()
            .find(|tag| tag.name == name)
            .map(|tag| tag.uid);
        let tag_uid = existing.unwrap_or_else(|| {
            let uid = self.next_uid();
            self.hashtags.insert(uid, Hashtag { uid, name: name.to_string() });
            uid
        });
        self.post_tags.entry(post_uid).or_default().push(tag_uid);
        tag_uid
    }

    pub fn attach_file(&self, post_uid: Uid, name: &str, path: &str, size: u64) -> Uid {
        let uid = self.next_uid();
        self.files.insert(
            uid,
            FileRow { uid, post_uid, name: name.to_string(), path: path.to_string() },
        );
        self.file_sizes.insert(path.to_string(), size);
        uid
    }

    /// The image's thumbnail doubles as the post cover when it is the
    /// post's first one.
    pub fn attach_image(&self, post_uid: Uid, image: NewImage) -> Uid {
        let file_uid = self.attach_file(post_uid, &image.path, &image.path, 1);
        let uid = self.next_uid();
        self.images.insert(
            uid,
            ImageRow { uid, file_uid, post_uid, path: image.path },
        );
        if let Some(thumbnail) = image.thumbnail {
            self.thumbnails.insert(file_uid, thumbnail);
        }
        if let Some(exif) = image.exif {
            self.exifs.insert(file_uid, exif);
        }
        if let Some(description) = image.description {
            self.descriptions.insert(file_uid, description);
        }
        uid
    }

    // ── Queries ─────────────────────────────────────────────────────────────

    fn windowed(&self, mut rows: Vec<PostRow>, window: PageWindow) -> Vec<PostRow> {
        let cursor = window.cursor;
        rows.retain(|row| cursor.admits(row.uid));
        rows.sort_by(|a, b| cursor.compare(a.uid, b.uid));
        window.slice(rows)
    }

    fn image_posts_matching(&self, keyword: &str) -> HashSet<Uid> {
        self.images
            .iter()
            .filter(|image| {
                self.descriptions
                    .get(&image.file_uid)
                    .is_some_and(|description| description.contains(keyword))
            })
            .map(|image| image.post_uid)
            .collect()
    }

    fn matches(
        &self,
        row: &PostRow,
        filter: &PostFilter,
        scope: SecretScope,
        image_posts: &HashSet<Uid>,
    ) -> bool {
        match filter {
            PostFilter::Window => true,
            PostFilter::Text(TextField::Title, keyword) => row.title.contains(keyword.as_str()),
            PostFilter::Text(TextField::Content, keyword) => {
                scope.admits(row.status, row.writer_uid) && row.content.contains(keyword.as_str())
            }
            PostFilter::Writer(writer_uid) => row.writer_uid == *writer_uid,
            PostFilter::Tags(tag_uids) => self
                .post_tags
                .get(&row.uid)
                .is_some_and(|tags| tags.iter().any(|tag| tag_uids.contains(tag))),
            PostFilter::ImageDescription(_) => {
                scope.admits(row.status, row.writer_uid) && image_posts.contains(&row.uid)
            }
        }
    }

    fn count_likes(likes: &DashMap<(Uid, Uid), LikeRecord>, uids: &[Uid]) -> HashMap<Uid, u64> {
        let wanted: HashSet<Uid> = uids.iter().copied().collect();
        let mut counts = HashMap::new();
        for like in likes.iter().filter(|like| like.liked && wanted.contains(&like.target_uid)) {
            *counts.entry(like.target_uid).or_insert(0) += 1;
        }
        counts
    }

    fn liked_among(
        likes: &DashMap<(Uid, Uid), LikeRecord>,
        uids: &[Uid],
        user_uid: Uid,
    ) -> HashSet<Uid> {
        uids.iter()
            .copied()
            .filter(|uid| likes.get(&(*uid, user_uid)).is_some_and(|like| like.liked))
            .collect()
    }
}

#[async_trait]
impl BoardRepo for MemoryStore {
    async fn board_uid_by_id(&self, id: &str) -> anyhow::Result<Option<Uid>> {
        Ok(self.boards.iter().find(|board| board.id == id).map(|board| board.uid))
    }

    async fn board_config(&self, board_uid: Uid) -> anyhow::Result<Option<BoardConfig>> {
        let Some(mut config) = self.boards.get(&board_uid).map(|board| board.clone()) else {
            return Ok(None);
        };
        if config.use_category {
            let mut categories: Vec<CategoryRef> = self
                .categories
                .iter()
                .filter(|category| category.board_uid == board_uid)
                .map(|category| CategoryRef { uid: category.uid, name: category.name.clone() })
                .collect();
            categories.sort_by_key(|category| category.uid);
            config.categories = categories;
        }
        Ok(Some(config))
    }

    async fn board_basics(&self, board_uids: &[Uid]) -> anyhow::Result<HashMap<Uid, BoardBasic>> {
        Ok(board_uids
            .iter()
            .filter_map(|uid| self.boards.get(uid).map(|board| (*uid, board.basic())))
            .collect())
    }

    async fn category_names(&self, category_uids: &[Uid]) -> anyhow::Result<HashMap<Uid, String>> {
        Ok(category_uids
            .iter()
            .filter_map(|uid| self.categories.get(uid).map(|c| (*uid, c.name.clone())))
            .collect())
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn writers(&self, user_uids: &[Uid]) -> anyhow::Result<HashMap<Uid, Writer>> {
        Ok(user_uids
            .iter()
            .filter_map(|uid| self.users.get(uid).map(|user| (*uid, user.writer.clone())))
            .collect())
    }

    async fn writer_uid_by_name(&self, name: &str) -> anyhow::Result<Option<Uid>> {
        Ok(self
            .users
            .iter()
            .filter(|user| user.writer.name.contains(name))
            .max_by_key(|user| (user.signup, user.writer.uid))
            .map(|user| user.writer.uid))
    }

    async fn black_list(&self, user_uid: Uid) -> anyhow::Result<Vec<Uid>> {
        Ok(self
            .users
            .get(&user_uid)
            .map(|user| user.black_list.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl PostRepo for MemoryStore {
    async fn max_uid(&self) -> anyhow::Result<Uid> {
        Ok(self.posts.iter().map(|post| post.uid).max().unwrap_or_default())
    }

    async fn total_count(&self, board_uid: Uid) -> anyhow::Result<u64> {
        let count = self
            .posts
            .iter()
            .filter(|post| post.board_uid == board_uid && !post.status.is_removed())
            .count();
        Ok(u64::try_from(count)?)
    }

    async fn notices(&self, board_uid: Uid) -> anyhow::Result<Vec<PostRow>> {
        let mut notices: Vec<PostRow> = self
            .posts
            .iter()
            .filter(|post| post.board_uid == board_uid && post.status == Status::Notice)
            .map(|post| post.clone())
            .collect();
        notices.sort_by(|a, b| b.uid.cmp(&a.uid));
        Ok(notices)
    }

    async fn find(
        &self,
        board_uid: Uid,
        filter: &PostFilter,
        scope: SecretScope,
        window: PageWindow,
    ) -> anyhow::Result<Vec<PostRow>> {
        let image_posts = match filter {
            PostFilter::ImageDescription(keyword) => self.image_posts_matching(keyword),
            _ => HashSet::new(),
        };
        let rows: Vec<PostRow> = self
            .posts
            .iter()
            .filter(|post| {
                post.board_uid == board_uid
                    && matches!(post.status, Status::Normal | Status::Secret)
                    && self.matches(post, filter, scope, &image_posts)
            })
            .map(|post| post.clone())
            .collect();
        Ok(self.windowed(rows, window))
    }

    async fn latest(&self, board_uid: Uid, window: PageWindow) -> anyhow::Result<Vec<PostRow>> {
        let rows: Vec<PostRow> = self
            .posts
            .iter()
            .filter(|post| {
                post.status == Status::Normal && (board_uid == 0 || post.board_uid == board_uid)
            })
            .map(|post| post.clone())
            .collect();
        Ok(self.windowed(rows, window))
    }

    async fn hashtag_uid(&self, name: &str) -> anyhow::Result<Option<Uid>> {
        Ok(self.hashtags.iter().find(|tag| tag.name == name).map(|tag| tag.uid))
    }

    async fn post(&self, post_uid: Uid) -> anyhow::Result<Option<PostRow>> {
        Ok(self.posts.get(&post_uid).map(|post| post.clone()))
    }

    async fn prev_uid(&self, board_uid: Uid, post_uid: Uid) -> anyhow::Result<Uid> {
        Ok(self
            .posts
            .iter()
            .filter(|p| p.board_uid == board_uid && !p.status.is_removed() && p.uid < post_uid)
            .map(|p| p.uid)
            .max()
            .unwrap_or_default())
    }

    async fn next_uid(&self, board_uid: Uid, post_uid: Uid) -> anyhow::Result<Uid> {
        Ok(self
            .posts
            .iter()
            .filter(|p| p.board_uid == board_uid && !p.status.is_removed() && p.uid > post_uid)
            .map(|p| p.uid)
            .min()
            .unwrap_or_default())
    }

    async fn increment_hit(&self, post_uid: Uid) -> anyhow::Result<()> {
        if let Some(mut post) = self.posts.get_mut(&post_uid) {
            post.hit += 1;
        }
        Ok(())
    }

    async fn attachments(&self, post_uid: Uid) -> anyhow::Result<Vec<FileRow>> {
        let image_files: HashSet<Uid> = self.images.iter().map(|image| image.file_uid).collect();
        let mut files: Vec<FileRow> = self
            .files
            .iter()
            .filter(|file| file.post_uid == post_uid && !image_files.contains(&file.uid))
            .map(|file| file.clone())
            .collect();
        files.sort_by_key(|file| file.uid);
        Ok(files)
    }

    async fn images(&self, post_uid: Uid) -> anyhow::Result<Vec<ImageRow>> {
        let mut images: Vec<ImageRow> = self
            .images
            .iter()
            .filter(|image| image.post_uid == post_uid)
            .map(|image| image.clone())
            .collect();
        images.sort_by_key(|image| image.uid);
        Ok(images)
    }

    async fn thumbnail(&self, file_uid: Uid) -> anyhow::Result<Option<Thumbnail>> {
        Ok(self.thumbnails.get(&file_uid).map(|thumb| thumb.clone()))
    }

    async fn exif(&self, file_uid: Uid) -> anyhow::Result<Option<Exif>> {
        Ok(self.exifs.get(&file_uid).map(|exif| exif.clone()))
    }

    async fn image_description(&self, file_uid: Uid) -> anyhow::Result<Option<String>> {
        Ok(self.descriptions.get(&file_uid).map(|d| d.clone()))
    }

    async fn tags(&self, post_uid: Uid) -> anyhow::Result<Vec<Hashtag>> {
        let tag_uids = self.post_tags.get(&post_uid).map(|t| t.clone()).unwrap_or_default();
        Ok(tag_uids
            .iter()
            .filter_map(|uid| self.hashtags.get(uid).map(|tag| tag.clone()))
            .collect())
    }

    async fn latest_by_writer(&self, writer_uid: Uid, limit: u64) -> anyhow::Result<Vec<PostRow>> {
        let mut rows: Vec<PostRow> = self
            .posts
            .iter()
            .filter(|post| post.writer_uid == writer_uid && !post.status.is_removed())
            .map(|post| post.clone())
            .collect();
        rows.sort_by(|a, b| b.uid.cmp(&a.uid));
        Ok(PageWindow::new(Cursor::default(), 0, limit).slice(rows))
    }

    async fn cover_paths(&self, post_uids: &[Uid]) -> anyhow::Result<HashMap<Uid, String>> {
        let mut images: Vec<ImageRow> = self
            .images
            .iter()
            .filter(|image| post_uids.contains(&image.post_uid))
            .map(|image| image.clone())
            .collect();
        images.sort_by_key(|image| image.uid);
        let mut covers = HashMap::new();
        for image in images {
            if covers.contains_key(&image.post_uid) {
                continue;
            }
            if let Some(thumbnail) = self.thumbnails.get(&image.file_uid) {
                covers.insert(image.post_uid, thumbnail.small.clone());
            }
        }
        Ok(covers)
    }

    async fn comment_counts(&self, post_uids: &[Uid]) -> anyhow::Result<HashMap<Uid, u64>> {
        let mut counts = HashMap::new();
        for comment in self.comments.iter() {
            if !comment.status.is_removed() && post_uids.contains(&comment.post_uid) {
                *counts.entry(comment.post_uid).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    async fn like_counts(&self, post_uids: &[Uid]) -> anyhow::Result<HashMap<Uid, u64>> {
        Ok(Self::count_likes(&self.post_likes, post_uids))
    }

    async fn liked_by(&self, post_uids: &[Uid], user_uid: Uid) -> anyhow::Result<HashSet<Uid>> {
        Ok(Self::liked_among(&self.post_likes, post_uids, user_uid))
    }
}

#[async_trait]
impl CommentRepo for MemoryStore {
    async fn max_uid(&self) -> anyhow::Result<Uid> {
        Ok(self.comments.iter().map(|comment| comment.uid).max().unwrap_or_default())
    }

    async fn total_count(&self, post_uid: Uid) -> anyhow::Result<u64> {
        let count = self
            .comments
            .iter()
            .filter(|comment| comment.post_uid == post_uid && !comment.status.is_removed())
            .count();
        Ok(u64::try_from(count)?)
    }

    async fn thread(&self, post_uid: Uid, window: PageWindow) -> anyhow::Result<Vec<CommentRow>> {
        let cursor = window.cursor;
        let mut rows: Vec<CommentRow> = self
            .comments
            .iter()
            .filter(|c| c.post_uid == post_uid && !c.status.is_removed() && cursor.admits(c.uid))
            .map(|comment| comment.clone())
            .collect();
        rows.sort_by(|a, b| {
            a.reply_uid
                .cmp(&b.reply_uid)
                .then_with(|| cursor.compare(a.uid, b.uid))
        });
        Ok(window.slice(rows))
    }

    async fn latest_by_writer(
        &self,
        writer_uid: Uid,
        limit: u64,
    ) -> anyhow::Result<Vec<CommentRow>> {
        let mut rows: Vec<CommentRow> = self
            .comments
            .iter()
            .filter(|c| c.writer_uid == writer_uid && !c.status.is_removed())
            .map(|comment| comment.clone())
            .collect();
        rows.sort_by(|a, b| b.uid.cmp(&a.uid));
        Ok(PageWindow::new(Cursor::default(), 0, limit).slice(rows))
    }

    async fn like_counts(&self, comment_uids: &[Uid]) -> anyhow::Result<HashMap<Uid, u64>> {
        Ok(Self::count_likes(&self.comment_likes, comment_uids))
    }

    async fn liked_by(&self, comment_uids: &[Uid], user_uid: Uid) -> anyhow::Result<HashSet<Uid>> {
        Ok(Self::liked_among(&self.comment_likes, comment_uids, user_uid))
    }
}

#[async_trait]
impl AccessOracle for MemoryStore {
    async fn is_site_admin(&self, user_uid: Uid) -> anyhow::Result<bool> {
        Ok(self.users.get(&user_uid).is_some_and(|user| user.site_admin))
    }

    async fn is_group_admin(&self, group_uid: Uid, user_uid: Uid) -> anyhow::Result<bool> {
        Ok(self.group_admins.get(&group_uid).is_some_and(|admin| *admin == user_uid))
    }

    async fn level_and_point(&self, user_uid: Uid) -> anyhow::Result<(u32, i64)> {
        Ok(self
            .users
            .get(&user_uid)
            .map(|user| (user.level, user.point))
            .unwrap_or_default())
    }
}

#[async_trait]
impl FileResolver for MemoryStore {
    async fn file_size(&self, path: &str) -> u64 {
        self.file_sizes.get(path).map(|size| *size).unwrap_or_default()
    }
}
