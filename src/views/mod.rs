//! 服务端渲染的 HTML
//!
//! 页面模板与静态资源通过 rust-embed 内嵌。模板中的 `%NAME%`
//! 占位符一次替换完成，替换进去的文本不会再被扫描。
//! 用户提供的内容都在这里转义；消息正文已由
//! [`crate::utils::render_message`] 渲染。

use std::collections::HashMap;

use rust_embed::Embed;
use tracing::warn;

use crate::errors::TalkError;
use crate::services::{
    ContentView, FeedItem, FeedSource, PostThread, ProfilePage, Recommendation, SearchResults,
};
use crate::storage::{ContentKind, Course, User};
use crate::utils::{MediaType, Paged, escape_html, render_message};

#[derive(Embed)]
#[folder = "templates/"]
struct Templates;

#[derive(Embed)]
#[folder = "static/"]
pub struct StaticAssets;

/// 每个页面都需要的请求级数据
#[derive(Debug, Clone, Default)]
pub struct PageFrame {
    pub viewer: Option<String>,
    pub csrf: String,
    pub flashes: Vec<String>,
}

impl PageFrame {
    fn is_viewer(&self, z_id: &str) -> bool {
        self.viewer.as_deref() == Some(z_id)
    }

    /// 附带 CSRF 令牌的表单 action
    fn action(&self, path: &str) -> String {
        format!(
            "{}?csrf_token={}",
            path,
            urlencoding::encode(&self.csrf)
        )
    }
}

// ============================================================
// 模板工具
// ============================================================

fn template(name: &str) -> String {
    match Templates::get(name) {
        Some(file) => String::from_utf8_lossy(&file.data).into_owned(),
        None => {
            warn!("Template not found: {}", name);
            String::new()
        }
    }
}

/// 一次替换 `%KEY%` 占位符；未知的键保持原样
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let values: HashMap<&str, &str> = values.iter().copied().collect();
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('%') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let key_len = after
            .find(|c: char| !(c.is_ascii_uppercase() || c == '_'))
            .unwrap_or(after.len());

        let key = &after[..key_len];
        match values.get(key) {
            Some(value) if !key.is_empty() && after[key_len..].starts_with('%') => {
                out.push_str(value);
                rest = &after[key_len + 1..];
            }
            _ => {
                out.push('%');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn render(name: &str, values: &[(&str, &str)]) -> String {
    fill(&template(name), values)
}

/// 用站点布局包裹页面内容
fn layout(frame: &PageFrame, title: &str, body: &str) -> String {
    let nav = match &frame.viewer {
        Some(z_id) => render(
            "partials/nav_member.html",
            &[
                ("ZID", &escape_html(z_id)),
                ("CSRF", &escape_html(&frame.csrf)),
            ],
        ),
        None => template("partials/nav_guest.html"),
    };

    let flashes: String = frame
        .flashes
        .iter()
        .map(|m| format!("<li>{}</li>", escape_html(m)))
        .collect();
    let flashes = if flashes.is_empty() {
        String::new()
    } else {
        format!("<ul class=\"flashes\">{}</ul>", flashes)
    };

    render(
        "layout.html",
        &[
            ("TITLE", &escape_html(title)),
            ("NAV", &nav),
            ("FLASHES", &flashes),
            ("BODY", body),
        ],
    )
}

/// 存储图片或上传路径对应的 URL
pub fn media_url(path: &str) -> String {
    if path.starts_with("images/") {
        format!("/{}", path)
    } else {
        format!("/images/{}", path.trim_start_matches('/'))
    }
}

fn pager(base: &str, prev: Option<u64>, next: Option<u64>, query: Option<&str>) -> String {
    let suffix = query
        .map(|q| format!("?q={}", urlencoding::encode(q)))
        .unwrap_or_default();
    let link = |page: u64, label: &str, class: &str| {
        format!(
            "<a class=\"{}\" href=\"{}/{}{}\">{}</a>",
            class,
            base,
            page,
            escape_html(&suffix),
            label
        )
    };

    let mut html = String::from("<nav class=\"pager\">");
    if let Some(page) = prev {
        html.push_str(&link(page, "&larr; Newer", "prev"));
    }
    if let Some(page) = next {
        html.push_str(&link(page, "Older &rarr;", "next"));
    }
    html.push_str("</nav>");
    html
}

// ============================================================
// 页面片段
// ============================================================

fn media_html(view: &ContentView) -> String {
    let Some(path) = view.content.content_path.as_deref() else {
        return String::new();
    };
    let url = escape_html(&media_url(path));
    match view.content.media_type {
        MediaType::Image => format!("<img class=\"media\" src=\"{}\" alt=\"\">", url),
        MediaType::Video => format!("<video class=\"media\" src=\"{}\" controls></video>", url),
        MediaType::Text => String::new(),
    }
}

fn delete_form(frame: &PageFrame, kind: ContentKind, id: &str) -> String {
    let (path, field) = match kind {
        ContentKind::Post => ("/delete_post", "post_id"),
        ContentKind::Comment => ("/delete_comment", "comment_id"),
        ContentKind::Reply => ("/delete_reply", "reply_id"),
    };
    render(
        "partials/delete_form.html",
        &[
            ("ACTION", &escape_html(&frame.action(path))),
            ("FIELD", field),
            ("ID", &escape_html(id)),
        ],
    )
}

fn content_card(view: &ContentView, label: &str, actions: &str) -> String {
    let c = &view.content;
    let anchor = match c.kind {
        ContentKind::Post => format!("/post/{}", c.id),
        _ => format!("/post/{}#{}", c.post_id, c.id),
    };

    render(
        "partials/content.html",
        &[
            ("KIND", &c.kind.to_string()),
            ("ID", &escape_html(&c.id)),
            ("AUTHOR_ID", &escape_html(&c.user)),
            ("AUTHOR_NAME", &escape_html(&view.author_name)),
            ("LABEL", &escape_html(label)),
            ("LINK", &escape_html(&anchor)),
            ("TIMESTAMP", &escape_html(&view.timestamp)),
            ("MESSAGE", &view.html),
            ("MEDIA", &media_html(view)),
            ("ACTIONS", actions),
        ],
    )
}

/// 帖子详情页之外展示帖子、评论或回复的卡片
fn feed_card(frame: &PageFrame, view: &ContentView, label: &str) -> String {
    let actions = if frame.is_viewer(&view.content.user) {
        delete_form(frame, view.content.kind, &view.content.id)
    } else {
        String::new()
    };
    content_card(view, label, &actions)
}

fn user_card(user: &User, extra: &str) -> String {
    render(
        "partials/user_card.html",
        &[
            ("AVATAR", &escape_html(&media_url(user.profile_image()))),
            ("ZID", &escape_html(&user.z_id)),
            ("NAME", &escape_html(&user.name)),
            ("EXTRA", extra),
        ],
    )
}

fn content_form(frame: &PageFrame, path: &str, hidden: &[(&str, &str)], button: &str) -> String {
    let hidden: String = hidden
        .iter()
        .map(|(name, value)| {
            format!(
                "<input type=\"hidden\" name=\"{}\" value=\"{}\">",
                name,
                escape_html(value)
            )
        })
        .collect();
    render(
        "partials/content_form.html",
        &[
            ("ACTION", &escape_html(&frame.action(path))),
            ("HIDDEN", &hidden),
            ("BUTTON", button),
        ],
    )
}

fn optional(value: Option<&str>) -> String {
    escape_html(value.unwrap_or(""))
}

// ============================================================
// 页面
// ============================================================

/// 无请求上下文时（中间件中）使用的简单错误页
pub fn error_page(title: &str, message: &str) -> String {
    let body = render(
        "error.html",
        &[
            ("TITLE", &escape_html(title)),
            ("CODE", ""),
            ("MESSAGE", &escape_html(message)),
        ],
    );
    layout(&PageFrame::default(), title, &body)
}

pub fn error(frame: &PageFrame, err: &TalkError) -> String {
    // 内部细节只写日志
    let message = if err.is_user_facing() {
        err.message().to_string()
    } else {
        "Something went wrong on our side. Please try again later.".to_string()
    };
    let body = render(
        "error.html",
        &[
            ("TITLE", &escape_html(err.error_type())),
            ("CODE", err.code()),
            ("MESSAGE", &escape_html(&message)),
        ],
    );
    layout(frame, err.error_type(), &body)
}

pub fn start(frame: &PageFrame) -> String {
    layout(frame, "UNSWtalk", &template("start.html"))
}

pub fn login(frame: &PageFrame) -> String {
    layout(frame, "Log in", &template("login.html"))
}

pub fn signup(frame: &PageFrame) -> String {
    layout(frame, "Sign up", &template("signup.html"))
}

pub fn forgot(frame: &PageFrame) -> String {
    layout(frame, "Forgot password", &template("forgot.html"))
}

pub fn reset(frame: &PageFrame, token: &str, z_id: &str) -> String {
    let body = render(
        "reset.html",
        &[
            ("TOKEN", &escape_html(&urlencoding::encode(token))),
            ("ZID", &escape_html(z_id)),
        ],
    );
    layout(frame, "Reset password", &body)
}

pub fn home(frame: &PageFrame, feed: &Paged<FeedItem>) -> String {
    let items: String = feed
        .items
        .iter()
        .map(|item| {
            let label = match (item.source, item.view.content.kind) {
                (FeedSource::Own, _) => "",
                (FeedSource::Friend, _) => "friend",
                (FeedSource::Mention, ContentKind::Post) => "mentioned you in a post",
                (FeedSource::Mention, ContentKind::Comment) => "mentioned you in a comment",
                (FeedSource::Mention, ContentKind::Reply) => "mentioned you in a reply",
            };
            feed_card(frame, &item.view, label)
        })
        .collect();

    let body = render(
        "home.html",
        &[
            ("NEW_POST", &content_form(frame, "/newpost", &[], "Post")),
            (
                "FEED",
                if items.is_empty() {
                    "<p class=\"empty\">Nothing here yet. Add some friends or write a post.</p>"
                } else {
                    items.as_str()
                },
            ),
            ("PAGER", &pager("/home", feed.prev_page, feed.next_page, None)),
        ],
    );
    layout(frame, "Home", &body)
}

pub fn search(frame: &PageFrame, results: &SearchResults) -> String {
    let users: String = results.users.iter().map(|u| user_card(u, "")).collect();
    let content: String = results
        .content
        .iter()
        .map(|view| feed_card(frame, view, ""))
        .collect();

    let body = render(
        "search.html",
        &[
            ("QUERY", &escape_html(&results.query)),
            (
                "USERS",
                if users.is_empty() {
                    "<li class=\"empty\">No matching users</li>"
                } else {
                    users.as_str()
                },
            ),
            (
                "CONTENT",
                if content.is_empty() {
                    "<p class=\"empty\">No matching posts</p>"
                } else {
                    content.as_str()
                },
            ),
            (
                "PAGER",
                &pager(
                    "/search",
                    results.prev_page,
                    results.next_page,
                    Some(&results.query),
                ),
            ),
        ],
    );
    layout(frame, "Search", &body)
}

fn friend_controls(frame: &PageFrame, page: &ProfilePage) -> String {
    let z_id = &page.user.z_id;
    let viewer = frame.viewer.as_deref().unwrap_or("");

    if frame.is_viewer(z_id) {
        return format!(
            "<a class=\"button\" href=\"/edit_profile/{}\">Edit profile</a>",
            escape_html(z_id)
        );
    }

    let post_button = |path: &str, label: &str, hidden: &str| {
        format!(
            "<form method=\"post\" action=\"{}\">{}<button>{}</button></form>",
            escape_html(&frame.action(path)),
            hidden,
            label
        )
    };

    match &page.friendship {
        Some(f) if f.accepted => post_button(
            "/removefriend",
            "Remove friend",
            &format!(
                "<input type=\"hidden\" name=\"z_id\" value=\"{}\">",
                escape_html(z_id)
            ),
        ),
        Some(_) => "<span class=\"pending\">Friend request sent</span>".to_string(),
        None if page.pending_from_user => format!(
            "<a class=\"button\" href=\"/addfriend/{}/{}\">Accept friend request</a>",
            escape_html(z_id),
            escape_html(viewer)
        ),
        None => post_button(&format!("/friend_request/{}", z_id), "Add friend", ""),
    }
}

fn course_list(frame: &PageFrame, courses: &[Course], removable: bool) -> String {
    if courses.is_empty() {
        return "<li class=\"empty\">No courses</li>".to_string();
    }
    courses
        .iter()
        .map(|c| {
            let remove = if removable {
                format!(
                    " <form class=\"inline\" method=\"post\" action=\"{}\"><button>Remove</button></form>",
                    escape_html(&frame.action(&format!(
                        "/remove_course/{}",
                        urlencoding::encode(&c.code)
                    )))
                )
            } else {
                String::new()
            };
            format!(
                "<li>{} <span class=\"offering\">{} {}</span>{}</li>",
                escape_html(&c.code),
                c.year,
                escape_html(&c.semester),
                remove
            )
        })
        .collect()
}

pub fn profile(frame: &PageFrame, page: &ProfilePage) -> String {
    let user = &page.user;
    let background = user
        .background_path
        .as_deref()
        .filter(|p| !p.is_empty())
        .map(|p| {
            format!(
                "style=\"background-image: url('{}')\"",
                escape_html(&media_url(p))
            )
        })
        .unwrap_or_default();
    let bio = user
        .bio
        .as_deref()
        .map(|b| render_message(b, &HashMap::new()))
        .unwrap_or_default();
    let friends: String = page.friends.iter().map(|f| user_card(f, "")).collect();
    let posts: String = page
        .posts
        .iter()
        .map(|view| feed_card(frame, view, ""))
        .collect();

    let body = render(
        "profile.html",
        &[
            ("BACKGROUND", &background),
            ("AVATAR", &escape_html(&media_url(user.profile_image()))),
            ("NAME", &escape_html(&user.name)),
            ("ZID", &escape_html(&user.z_id)),
            ("PROGRAM", &optional(user.program.as_deref())),
            ("BIRTHDAY", &optional(user.birthday.as_deref())),
            ("BIO", &bio),
            ("FRIEND_CONTROLS", &friend_controls(frame, page)),
            ("COURSES", &course_list(frame, &page.courses, false)),
            (
                "FRIENDS",
                if friends.is_empty() {
                    "<li class=\"empty\">No friends yet</li>"
                } else {
                    friends.as_str()
                },
            ),
            (
                "POSTS",
                if posts.is_empty() {
                    "<p class=\"empty\">No posts yet</p>"
                } else {
                    posts.as_str()
                },
            ),
        ],
    );
    layout(frame, &user.name, &body)
}

pub fn edit_profile(frame: &PageFrame, user: &User, courses: &[Course]) -> String {
    let z_id = &user.z_id;
    let coordinate = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_default();
    let delete_image = |slot: &str| {
        escape_html(&frame.action(&format!("/delete_user_image/{}/{}", z_id, slot)))
    };

    let body = render(
        "edit_profile.html",
        &[
            (
                "ACTION",
                &escape_html(&frame.action(&format!("/edit_profile/{}", z_id))),
            ),
            ("ZID", &escape_html(z_id)),
            ("NAME", &escape_html(&user.name)),
            ("EMAIL", &escape_html(&user.email)),
            ("PROGRAM", &optional(user.program.as_deref())),
            ("BIRTHDAY", &optional(user.birthday.as_deref())),
            ("SUBURB", &optional(user.suburb.as_deref())),
            ("LATITUDE", &coordinate(user.latitude)),
            ("LONGITUDE", &coordinate(user.longitude)),
            ("BIO", &optional(user.bio.as_deref())),
            ("AVATAR", &escape_html(&media_url(user.profile_image()))),
            ("DELETE_IMAGE", &delete_image("image")),
            ("DELETE_BACKGROUND", &delete_image("background")),
            ("ADD_COURSE", &escape_html(&frame.action("/add_course"))),
            ("COURSES", &course_list(frame, courses, true)),
        ],
    );
    layout(frame, "Edit profile", &body)
}

pub fn post(frame: &PageFrame, thread: &PostThread) -> String {
    let post_author = thread.post.content.user.as_str();
    let post_id = thread.post.content.id.as_str();
    let viewer_is = |z_id: &str| frame.is_viewer(z_id);

    let post_actions = if viewer_is(post_author) {
        delete_form(frame, ContentKind::Post, post_id)
    } else {
        String::new()
    };

    let comments: String = thread
        .comments
        .iter()
        .map(|t| {
            let comment = &t.comment.content;
            let replies: String = t
                .replies
                .iter()
                .map(|r| {
                    let can_delete = viewer_is(&r.content.user)
                        || viewer_is(&comment.user)
                        || viewer_is(post_author);
                    let actions = if can_delete {
                        delete_form(frame, ContentKind::Reply, &r.content.id)
                    } else {
                        String::new()
                    };
                    content_card(r, "", &actions)
                })
                .collect();

            let mut actions = String::new();
            if viewer_is(&comment.user) || viewer_is(post_author) {
                actions.push_str(&delete_form(frame, ContentKind::Comment, &comment.id));
            }

            format!(
                "<section class=\"comment-thread\">{}<div class=\"replies\">{}{}</div></section>",
                content_card(&t.comment, "", &actions),
                replies,
                content_form(
                    frame,
                    "/newreply",
                    &[("post_id", post_id), ("comment_id", &comment.id)],
                    "Reply",
                )
            )
        })
        .collect();

    let body = render(
        "post.html",
        &[
            ("POST", &content_card(&thread.post, "", &post_actions)),
            (
                "NEW_COMMENT",
                &content_form(frame, "/newcomment", &[("post_id", post_id)], "Comment"),
            ),
            ("COMMENTS", &comments),
        ],
    );
    layout(frame, "Post", &body)
}

pub fn recommendations(frame: &PageFrame, page: &Paged<Recommendation>) -> String {
    let cards: String = page
        .items
        .iter()
        .map(|r| {
            let shared = format!(
                "<span class=\"shared\">{} shared course{}</span>\
                 <form class=\"inline\" method=\"post\" action=\"{}\"><button>Add friend</button></form>",
                r.shared_courses,
                if r.shared_courses == 1 { "" } else { "s" },
                escape_html(&frame.action(&format!("/friend_request/{}", r.user.z_id)))
            );
            user_card(&r.user, &shared)
        })
        .collect();

    let body = render(
        "recommendations.html",
        &[
            (
                "USERS",
                if cards.is_empty() {
                    "<li class=\"empty\">No recommendations yet. Add your courses on your profile.</li>"
                } else {
                    cards.as_str()
                },
            ),
            (
                "PAGER",
                &pager("/recommendations", page.prev_page, page.next_page, None),
            ),
        ],
    );
    layout(frame, "People you may know", &body)
}

pub fn add_friend(frame: &PageFrame, reference: &User, friend: &str) -> String {
    let body = render(
        "addfriend.html",
        &[
            (
                "ACTION",
                &escape_html(&frame.action(&format!(
                    "/addfriend/{}/{}",
                    reference.z_id, friend
                ))),
            ),
            ("CARD", &user_card(reference, "")),
            ("NAME", &escape_html(&reference.name)),
        ],
    );
    layout(frame, "Friend request", &body)
}

/// 内嵌静态资源的 Content-Type
pub fn content_type_for(path: &str) -> &'static str {
    match path.rsplit('.').next().map(|e| e.to_ascii_lowercase()).as_deref() {
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "application/javascript",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("mov") => "video/quicktime",
        Some("avi") => "video/x-msvideo",
        Some("flv") => "video/x-flv",
        _ => "application/octet-stream",
    }
}
