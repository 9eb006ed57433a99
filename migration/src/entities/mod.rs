pub mod comment;
pub mod course;
pub mod friendship;
pub mod post;
pub mod reply;
pub mod user;

pub use comment::Entity as CommentEntity;
pub use course::Entity as CourseEntity;
pub use friendship::Entity as FriendshipEntity;
pub use post::Entity as PostEntity;
pub use reply::Entity as ReplyEntity;
pub use user::Entity as UserEntity;
