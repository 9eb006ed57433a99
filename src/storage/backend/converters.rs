use tracing::warn;

use crate::storage::models::{Content, ContentKind, Course, Friendship, NewUser, User};
use crate::utils::MediaType;
use migration::entities::{comment, course, friendship, post, reply, user};

fn parse_media_type(raw: &str, id: &str) -> MediaType {
    raw.parse().unwrap_or_else(|_| {
        warn!("Unknown media type '{}' on content {}, treating as text", raw, id);
        MediaType::Text
    })
}

pub fn model_to_user(model: user::Model) -> User {
    User {
        z_id: model.z_id,
        name: model.name,
        email: model.email,
        password: model.password,
        program: model.program,
        birthday: model.birthday,
        suburb: model.suburb,
        latitude: model.latitude,
        longitude: model.longitude,
        bio: model.bio,
        image_path: model.image_path,
        background_path: model.background_path,
        verified: model.verified,
    }
}

pub fn new_user_to_active_model(new_user: &NewUser) -> user::ActiveModel {
    use sea_orm::ActiveValue::*;

    user::ActiveModel {
        z_id: Set(new_user.z_id.clone()),
        name: Set(new_user.name.clone()),
        email: Set(new_user.email.clone()),
        password: Set(new_user.password_hash.clone()),
        program: Set(None),
        birthday: Set(None),
        suburb: Set(None),
        latitude: Set(None),
        longitude: Set(None),
        bio: Set(None),
        image_path: Set(None),
        background_path: Set(None),
        verified: Set(false),
        reset_nonce: Set(None),
    }
}

pub fn post_to_content(model: post::Model) -> Content {
    Content {
        media_type: parse_media_type(&model.media_type, &model.id),
        post_id: model.id.clone(),
        id: model.id,
        kind: ContentKind::Post,
        comment_id: None,
        user: model.user,
        message: model.message,
        content_path: model.content_path,
        created_at: model.created_at,
    }
}

pub fn comment_to_content(model: comment::Model) -> Content {
    Content {
        media_type: parse_media_type(&model.media_type, &model.id),
        id: model.id,
        kind: ContentKind::Comment,
        post_id: model.post,
        comment_id: None,
        user: model.user,
        message: model.message,
        content_path: model.content_path,
        created_at: model.created_at,
    }
}

pub fn reply_to_content(model: reply::Model) -> Content {
    Content {
        media_type: parse_media_type(&model.media_type, &model.id),
        id: model.id,
        kind: ContentKind::Reply,
        post_id: model.post,
        comment_id: Some(model.comment),
        user: model.user,
        message: model.message,
        content_path: model.content_path,
        created_at: model.created_at,
    }
}

pub fn model_to_course(model: course::Model) -> Course {
    Course {
        user: model.user,
        code: model.code,
        year: model.year,
        semester: model.semester,
    }
}

pub fn model_to_friendship(model: friendship::Model) -> Friendship {
    Friendship {
        reference: model.reference,
        friend: model.friend,
        accepted: model.accepted,
    }
}
