//! ContentService tests
//!
//! Posting, threading, media uploads and the delete permission rules.

mod common;

use common::TestEnv;
use unswtalk::errors::TalkError;
use unswtalk::services::NewContent;
use unswtalk::storage::{ContentKind, NewContentRow};
use unswtalk::utils::MediaType;

fn text(message: &str) -> NewContent {
    NewContent::Text(message.to_string())
}

async fn env_with_members() -> TestEnv {
    let env = TestEnv::new().await;
    env.member("z5000001", "Andrew Taylor").await;
    env.member("z5000002", "Jeff Bezos").await;
    env.member("z5000003", "Ada Lovelace").await;
    env
}

#[tokio::test]
async fn test_empty_message_is_rejected() {
    let env = env_with_members().await;
    let err = env
        .services
        .content
        .create_post("z5000001", text("   \n"))
        .await
        .unwrap_err();
    assert!(matches!(err, TalkError::Validation(_)));
}

#[tokio::test]
async fn test_thread_links_comments_and_replies() {
    let env = env_with_members().await;
    let content = &env.services.content;

    let post = content
        .create_post("z5000001", text("Anyone doing COMP2041?"))
        .await
        .unwrap();
    assert_eq!(post.kind, ContentKind::Post);
    assert_eq!(post.post_id, post.id);

    let comment = content
        .create_comment("z5000002", &post.id, text("Me, with z5000001"))
        .await
        .unwrap();
    assert_eq!(comment.post_id, post.id);

    let reply = content
        .create_reply("z5000003", &comment.id, text("Same"))
        .await
        .unwrap();
    assert_eq!(reply.post_id, post.id);
    assert_eq!(reply.comment_id.as_deref(), Some(comment.id.as_str()));

    let thread = content.thread(&post.id).await.unwrap();
    assert_eq!(thread.post.author_name, "Andrew Taylor");
    assert_eq!(thread.comments.len(), 1);
    assert_eq!(thread.comments[0].replies.len(), 1);
    assert_eq!(thread.comments[0].replies[0].author_name, "Ada Lovelace");
    // Tags render as profile links with the tagged user's name
    assert!(thread.comments[0].comment.html.contains("/profile/z5000001"));
    assert!(thread.comments[0].comment.html.contains("Andrew Taylor"));
}

#[tokio::test]
async fn test_comment_on_missing_post() {
    let env = env_with_members().await;
    let err = env
        .services
        .content
        .create_comment("z5000001", "no-such-post", text("hello"))
        .await
        .unwrap_err();
    assert!(matches!(err, TalkError::NotFound(_)));

    let err = env
        .services
        .content
        .create_reply("z5000001", "no-such-comment", text("hello"))
        .await
        .unwrap_err();
    assert!(matches!(err, TalkError::NotFound(_)));
}

#[tokio::test]
async fn test_media_post_is_stored() {
    let env = env_with_members().await;
    let post = env
        .services
        .content
        .create_post(
            "z5000001",
            NewContent::Media {
                file_name: "holiday photo.PNG".to_string(),
                bytes: vec![0x89, b'P', b'N', b'G', 1, 2, 3],
            },
        )
        .await
        .unwrap();

    assert_eq!(post.media_type, MediaType::Image);
    assert!(post.message.is_empty());
    let path = post.content_path.expect("media path");
    let stored = env.services.media.open(&path).await.unwrap();
    assert_eq!(stored.bytes, vec![0x89, b'P', b'N', b'G', 1, 2, 3]);
}

#[tokio::test]
async fn test_unsupported_upload_is_rejected() {
    let env = env_with_members().await;
    let err = env
        .services
        .content
        .create_post(
            "z5000001",
            NewContent::Media {
                file_name: "script.sh".to_string(),
                bytes: b"rm -rf /".to_vec(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TalkError::Validation(_)));
}

#[tokio::test]
async fn test_delete_post_cascades() {
    let env = env_with_members().await;
    let content = &env.services.content;

    let post = content.create_post("z5000001", text("post")).await.unwrap();
    let c1 = content
        .create_comment("z5000002", &post.id, text("c1"))
        .await
        .unwrap();
    content
        .create_comment("z5000003", &post.id, text("c2"))
        .await
        .unwrap();
    content
        .create_reply("z5000003", &c1.id, text("r1"))
        .await
        .unwrap();

    let err = content.delete_post("z5000002", &post.id).await.unwrap_err();
    assert!(matches!(err, TalkError::Forbidden(_)));

    let summary = content.delete_post("z5000001", &post.id).await.unwrap();
    assert_eq!(summary.posts, 1);
    assert_eq!(summary.comments, 2);
    assert_eq!(summary.replies, 1);

    let err = content.thread(&post.id).await.unwrap_err();
    assert!(matches!(err, TalkError::NotFound(_)));
}

#[tokio::test]
async fn test_delete_post_follows_replies_through_comments() {
    let env = env_with_members().await;
    let content = &env.services.content;

    let post = content.create_post("z5000001", text("kept thread")).await.unwrap();
    let other = content.create_post("z5000002", text("elsewhere")).await.unwrap();
    let comment = content
        .create_comment("z5000002", &post.id, text("c1"))
        .await
        .unwrap();

    // 回复行上的 post 列与其评论所属帖子不一致
    let stray = env
        .storage
        .insert_reply(
            &other.id,
            &comment.id,
            NewContentRow {
                user: "z5000003".to_string(),
                message: "stray".to_string(),
                media_type: MediaType::Text,
                content_path: None,
            },
        )
        .await
        .unwrap();

    let summary = content.delete_post("z5000001", &post.id).await.unwrap();
    assert_eq!(summary.comments, 1);
    assert_eq!(summary.replies, 1);
    assert!(
        env.storage
            .get_content(ContentKind::Reply, &stray.id)
            .await
            .unwrap()
            .is_none()
    );
    content.thread(&other.id).await.unwrap();
}

#[tokio::test]
async fn test_deleting_content_removes_uploaded_files() {
    let env = env_with_members().await;
    let content = &env.services.content;
    let upload = |name: &str| NewContent::Media {
        file_name: name.to_string(),
        bytes: vec![0x89, b'P', b'N', b'G'],
    };

    let post = content.create_post("z5000001", upload("post.png")).await.unwrap();
    let comment = content
        .create_comment("z5000002", &post.id, upload("comment.png"))
        .await
        .unwrap();
    let reply = content
        .create_reply("z5000003", &comment.id, upload("reply.png"))
        .await
        .unwrap();
    let lone = content
        .create_reply("z5000003", &comment.id, upload("lone.png"))
        .await
        .unwrap();

    let lone_path = lone.content_path.clone().unwrap();
    let summary = content.delete_reply("z5000003", &lone.id).await.unwrap();
    assert_eq!(summary.media, vec![lone_path.clone()]);
    let gone = env.services.media.open(&lone_path).await.unwrap_err();
    assert!(matches!(gone, TalkError::NotFound(_)));

    let summary = content.delete_post("z5000001", &post.id).await.unwrap();
    assert_eq!(summary.media.len(), 3);
    for item in [&post, &comment, &reply] {
        let path = item.content_path.as_deref().unwrap();
        let gone = env.services.media.open(path).await.unwrap_err();
        assert!(matches!(gone, TalkError::NotFound(_)));
    }
}

#[tokio::test]
async fn test_post_author_may_delete_any_comment() {
    let env = env_with_members().await;
    let content = &env.services.content;

    let post = content.create_post("z5000001", text("post")).await.unwrap();
    let comment = content
        .create_comment("z5000002", &post.id, text("comment"))
        .await
        .unwrap();
    content
        .create_reply("z5000003", &comment.id, text("reply"))
        .await
        .unwrap();

    let err = content
        .delete_comment("z5000003", &comment.id)
        .await
        .unwrap_err();
    assert!(matches!(err, TalkError::Forbidden(_)));

    let summary = content.delete_comment("z5000001", &comment.id).await.unwrap();
    assert_eq!(summary.comments, 1);
    assert_eq!(summary.replies, 1);
    assert!(content.thread(&post.id).await.unwrap().comments.is_empty());
}

#[tokio::test]
async fn test_reply_delete_permissions() {
    let env = env_with_members().await;
    env.member("z5000004", "Grace Hopper").await;
    let content = &env.services.content;

    let post = content.create_post("z5000001", text("post")).await.unwrap();
    let comment = content
        .create_comment("z5000002", &post.id, text("comment"))
        .await
        .unwrap();
    let r1 = content
        .create_reply("z5000003", &comment.id, text("r1"))
        .await
        .unwrap();
    let r2 = content
        .create_reply("z5000003", &comment.id, text("r2"))
        .await
        .unwrap();
    let r3 = content
        .create_reply("z5000003", &comment.id, text("r3"))
        .await
        .unwrap();

    let err = content.delete_reply("z5000004", &r1.id).await.unwrap_err();
    assert!(matches!(err, TalkError::Forbidden(_)));

    // Reply author, comment author and post author may each delete
    assert_eq!(content.delete_reply("z5000003", &r1.id).await.unwrap().replies, 1);
    assert_eq!(content.delete_reply("z5000002", &r2.id).await.unwrap().replies, 1);
    assert_eq!(content.delete_reply("z5000001", &r3.id).await.unwrap().replies, 1);
}
