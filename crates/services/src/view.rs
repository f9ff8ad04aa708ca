//! # Post View Composer
//!
//! Everything the detail page shows for one post. Sub-fetches run one after
//! another without a shared transaction, so the composed view is not a
//! consistent snapshot.

use serde::Deserialize;

use domains::{
    AppError, AttachedImage, Attachment, BoardAction, PostRow, PostViewResult, Uid, WriterComment,
    WriterPost,
};

use crate::enrich::{degrade, distinct};
use crate::policy::Clearance;
use crate::FeedService;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewQuery {
    pub board_uid: Uid,
    pub post_uid: Uid,
    pub viewer_uid: Uid,
    pub update_hit: bool,
    /// Size of the author digest; capped by the engine config
    pub latest_limit: u64,
}

impl FeedService {
    /// The post, if the viewer may read it on this board.
    pub(crate) async fn readable_post(
        &self,
        board_uid: Uid,
        post_uid: Uid,
        clearance: &Clearance,
    ) -> domains::Result<PostRow> {
        let post = self
            .ports
            .posts
            .post(post_uid)
            .await?
            .filter(|post| !post.status.is_removed() && post.board_uid == board_uid)
            .ok_or_else(|| AppError::not_found("post", post_uid))?;
        clearance.check_secret(post.status, post.writer_uid)?;
        Ok(post)
    }

    #[tracing::instrument(
        skip_all,
        fields(
            board_uid = query.board_uid,
            post_uid = query.post_uid,
            viewer_uid = query.viewer_uid
        )
    )]
    pub async fn view_post(&self, query: &ViewQuery) -> domains::Result<PostViewResult> {
        let config = self.board_config(query.board_uid).await?;
        let clearance = self
            .policy
            .authorize(query.viewer_uid, &config, BoardAction::View)
            .await?;
        let row = self
            .readable_post(query.board_uid, query.post_uid, &clearance)
            .await?;
        let writer_uid = row.writer_uid;

        let post = self.enricher.post(row, query.viewer_uid).await;
        if query.update_hit {
            self.bump_hit(post.uid);
        }

        let (prev_post_uid, next_post_uid) = tokio::try_join!(
            self.ports.posts.prev_uid(query.board_uid, post.uid),
            self.ports.posts.next_uid(query.board_uid, post.uid),
        )?;
        let files = self.attachments(post.uid).await?;
        let images = self.images(post.uid).await?;
        let tags = self.ports.posts.tags(post.uid).await?;
        let limit = self.config.latest_limit(query.latest_limit);
        let (writer_posts, writer_comments) = self.writer_digest(writer_uid, limit).await?;

        Ok(PostViewResult {
            config,
            post,
            images,
            files,
            tags,
            prev_post_uid,
            next_post_uid,
            writer_posts,
            writer_comments,
        })
    }

    /// Approximate counter; concurrent views may race and a failure is only logged.
    fn bump_hit(&self, post_uid: Uid) {
        let posts = self.ports.posts.clone();
        tokio::spawn(async move {
            if let Err(e) = posts.increment_hit(post_uid).await {
                tracing::warn!(post_uid, error = %e, "failed to increment hit");
            }
        });
    }

    /// Zero-size or missing files are left out.
    async fn attachments(&self, post_uid: Uid) -> domains::Result<Vec<Attachment>> {
        let rows = self.ports.posts.attachments(post_uid).await?;
        let mut files = Vec::with_capacity(rows.len());
        for row in rows {
            let size = self.ports.files.file_size(&row.path).await;
            if size == 0 {
                tracing::debug!(file_uid = row.uid, path = %row.path, "skipping empty attachment");
                continue;
            }
            files.push(Attachment { uid: row.uid, name: row.name, path: row.path, size });
        }
        Ok(files)
    }

    async fn images(&self, post_uid: Uid) -> domains::Result<Vec<AttachedImage>> {
        let rows = self.ports.posts.images(post_uid).await?;
        let mut images = Vec::with_capacity(rows.len());
        for row in rows {
            let posts = &self.ports.posts;
            let (thumbnail, exif, description) = tokio::join!(
                posts.thumbnail(row.file_uid),
                posts.exif(row.file_uid),
                posts.image_description(row.file_uid),
            );
            images.push(AttachedImage {
                uid: row.uid,
                path: row.path,
                thumbnail: degrade("thumbnail", thumbnail).unwrap_or_default(),
                exif: degrade("exif", exif).unwrap_or_default(),
                description: degrade("image description", description).unwrap_or_default(),
            });
        }
        Ok(images)
    }

    async fn writer_digest(
        &self,
        writer_uid: Uid,
        limit: u64,
    ) -> domains::Result<(Vec<WriterPost>, Vec<WriterComment>)> {
        if writer_uid == 0 || limit == 0 {
            return Ok((Vec::new(), Vec::new()));
        }
        let (posts, comments) = tokio::try_join!(
            self.ports.posts.latest_by_writer(writer_uid, limit),
            self.ports.comments.latest_by_writer(writer_uid, limit),
        )?;

        let post_uids: Vec<Uid> = posts.iter().map(|post| post.uid).collect();
        let comment_uids: Vec<Uid> = comments.iter().map(|comment| comment.uid).collect();
        let board_uids = distinct(
            posts
                .iter()
                .map(|post| post.board_uid)
                .chain(comments.iter().map(|comment| comment.board_uid)),
        );
        let (boards, comment_counts, post_likes, comment_likes) = tokio::join!(
            self.ports.boards.board_basics(&board_uids),
            self.ports.posts.comment_counts(&post_uids),
            self.ports.posts.like_counts(&post_uids),
            self.ports.comments.like_counts(&comment_uids),
        );
        let boards = degrade("board basics", boards);
        let comment_counts = degrade("comment counts", comment_counts);
        let post_likes = degrade("post likes", post_likes);
        let comment_likes = degrade("comment likes", comment_likes);

        let writer_posts = posts
            .into_iter()
            .map(|post| WriterPost {
                board: boards.get(&post.board_uid).cloned().unwrap_or_default(),
                comment: comment_counts.get(&post.uid).copied().unwrap_or_default(),
                like: post_likes.get(&post.uid).copied().unwrap_or_default(),
                post_uid: post.uid,
                title: post.title,
                submitted: post.submitted,
            })
            .collect();
        let writer_comments = comments
            .into_iter()
            .map(|comment| WriterComment {
                board: boards.get(&comment.board_uid).cloned().unwrap_or_default(),
                like: comment_likes.get(&comment.uid).copied().unwrap_or_default(),
                post_uid: comment.post_uid,
                comment_uid: comment.uid,
                content: comment.content,
                submitted: comment.submitted,
            })
            .collect();
        Ok((writer_posts, writer_comments))
    }
}
