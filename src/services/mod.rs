//! HTTP 处理函数与 CLI 共用的业务逻辑

pub mod accounts;
pub mod content;
pub mod feed;
pub mod friends;
pub mod mail;
pub mod media;
pub mod names;
pub mod profile;
pub mod recommend;

use std::sync::Arc;
use std::time::Instant;

pub use accounts::{AccountService, SignupForm};
pub use content::{CommentThread, ContentService, ContentView, NewContent, PostThread};
pub use feed::{FeedEntry, FeedItem, FeedService, FeedSource, SearchResults, merge_feed};
pub use friends::{FriendService, Recommendation};
pub use mail::{LogMailer, MailMessage, Mailer, WebhookMailer, mailer_from_config};
pub use media::MediaStore;
pub use names::NameDirectory;
pub use profile::{ImageUpload, ProfileForm, ProfilePage, ProfileService};
pub use recommend::rank_classmates;

use crate::api::jwt::TokenService;
use crate::config::StaticConfig;
use crate::storage::SeaOrmStorage;

/// 请求处理所需的全部服务，在各 worker 间共享
pub struct AppServices {
    pub storage: Arc<SeaOrmStorage>,
    pub accounts: AccountService,
    pub content: ContentService,
    pub feed: FeedService,
    pub friends: FriendService,
    pub profiles: ProfileService,
    pub media: MediaStore,
    pub started_at: Instant,
}

impl AppServices {
    pub fn new(
        config: &StaticConfig,
        storage: Arc<SeaOrmStorage>,
        tokens: Arc<TokenService>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let names = NameDirectory::new(
            storage.clone(),
            config.cache.name_ttl_secs,
            config.cache.name_capacity,
        );
        let media = MediaStore::new(&config.media.upload_dir, config.media.max_upload_bytes);
        let public_url = config.server.public_url.clone();
        let per_page = config.feed.items_per_page;

        Self {
            accounts: AccountService::new(
                storage.clone(),
                tokens,
                mailer.clone(),
                names.clone(),
                public_url.clone(),
            ),
            content: ContentService::new(storage.clone(), media.clone(), names.clone()),
            feed: FeedService::new(storage.clone(), names.clone(), per_page),
            friends: FriendService::new(storage.clone(), mailer, public_url, per_page),
            profiles: ProfileService::new(storage.clone(), media.clone(), names),
            media,
            storage,
            started_at: Instant::now(),
        }
    }

    /// 根据全局配置构建：令牌密钥、邮件通道等
    pub fn from_config(storage: Arc<SeaOrmStorage>) -> Self {
        let config = crate::config::get_config();
        let tokens = Arc::new(TokenService::from_config());
        let mailer = mailer_from_config(&config.mail);
        Self::new(&config, storage, tokens, mailer)
    }
}
