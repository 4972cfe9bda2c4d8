use chrono::{DateTime, Utc};
use reqwest::{Method, Url};
use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::error::Result;
use crate::user::User;

/// A single story as the service hands it out.
///
/// Stories are plain values: the copies held by a [`crate::StoryList`] and
/// by a [`User`]'s own stories or favorites are independent, updating one of
/// them does not touch the others.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    /// Unique id assigned by the service.
    pub story_id: String,
    pub title: String,
    pub author: String,
    /// The address the story points to.
    pub url: String,
    /// Username of the submitter.
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Story {
    /// Update the story's author, title and url.
    ///
    /// Only the fields set in `update` are sent. The author, title, url and
    /// update timestamp the service returns are applied to `self`.
    pub async fn update(
        &mut self,
        client: &ApiClient,
        user: &User,
        update: &StoryUpdate,
    ) -> Result<&mut Self> {
        let url = client.endpoint(&["stories", self.story_id.as_str()])?;
        let resp: UpdatedStoryResponse = client
            .send(
                Method::PATCH,
                url,
                &StoryRequest {
                    token: &user.login_token,
                    story: update,
                },
            )
            .await?;

        let UpdatedStory {
            author,
            title,
            url,
            updated_at,
        } = resp.story;
        self.author = author;
        self.title = title;
        self.url = url;
        self.updated_at = updated_at;
        Ok(self)
    }

    /// The host this story links to, see [`host_name`].
    pub fn host_name(&self) -> Option<String> {
        host_name(&self.url)
    }
}

/// Extract the host of `url` without a leading `www.`.
///
/// Urls without a scheme are accepted as well. A non default port is kept,
/// the host comes back lowercased and `None` means no host could be found.
///
/// # Example
///
/// ```rust
///  use snooze::story::host_name;
///  assert_eq!(host_name("https://www.hello.com/path"), Some("hello.com".to_string()));
///  assert_eq!(host_name("www.hello.com"), Some("hello.com".to_string()));
/// ```
pub fn host_name(url: &str) -> Option<String> {
    let url = url.trim();
    let parsed = if url.contains("://") {
        Url::parse(url).ok()?
    } else {
        Url::parse(&format!("http://{}", url)).ok()?
    };
    let host = parsed.host_str()?;
    let host = host.strip_prefix("www.").unwrap_or(host);
    Some(match parsed.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

/// The content of a story to submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStory {
    pub title: String,
    pub author: String,
    pub url: String,
}

impl NewStory {
    pub fn new<T: ToString, A: ToString, U: ToString>(title: T, author: A, url: U) -> Self {
        Self {
            title: title.to_string(),
            author: author.to_string(),
            url: url.to_string(),
        }
    }
}

/// Partial update of a story, unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoryUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl StoryUpdate {
    pub fn title<T: ToString>(mut self, title: T) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn author<T: ToString>(mut self, author: T) -> Self {
        self.author = Some(author.to_string());
        self
    }

    pub fn url<T: ToString>(mut self, url: T) -> Self {
        self.url = Some(url.to_string());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.author.is_none() && self.url.is_none()
    }
}

/// Body of authenticated story requests.
#[derive(Debug, Serialize)]
pub(crate) struct StoryRequest<'a, S: Serialize> {
    pub token: &'a str,
    pub story: &'a S,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StoryResponse {
    pub story: Story,
}

#[derive(Debug, Deserialize)]
struct UpdatedStoryResponse {
    story: UpdatedStory,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdatedStory {
    author: String,
    title: String,
    url: String,
    updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_names() {
        assert_eq!(host_name("https://www.hello.com"), Some("hello.com".to_string()));
        assert_eq!(host_name("http://www.hello.com"), Some("hello.com".to_string()));
        assert_eq!(host_name("www.hello.com"), Some("hello.com".to_string()));
        assert_eq!(
            host_name("https://news.ycombinator.com/item?id=1"),
            Some("news.ycombinator.com".to_string())
        );
        assert_eq!(host_name("example.org/a/b"), Some("example.org".to_string()));
        assert_eq!(host_name(""), None);
    }

    #[test]
    fn host_names_keep_port() {
        assert_eq!(host_name("localhost:3000/a"), Some("localhost:3000".to_string()));
        assert_eq!(
            host_name("https://www.example.com:8443/x"),
            Some("example.com:8443".to_string())
        );
        assert_eq!(host_name("http://example.com:80/"), Some("example.com".to_string()));
        assert_eq!(host_name("www.Hello.com"), Some("hello.com".to_string()));
    }

    #[test]
    fn decode_story() {
        let story: Story = serde_json::from_str(
            r#"{
                "author": "Matt Lane",
                "createdAt": "2017-11-09T18:38:39.409Z",
                "storyId": "5081e46e-3143-4c0c-bbf4-c22eb11eb3f5",
                "title": "The Best Story Ever",
                "updatedAt": "2017-11-09T18:38:39.409Z",
                "url": "https://www.rithmschool.com/blog/do-web-developers-need-to-be-good-at-math",
                "username": "hueter"
            }"#,
        )
        .unwrap();
        assert_eq!(story.story_id, "5081e46e-3143-4c0c-bbf4-c22eb11eb3f5");
        assert_eq!(story.author, "Matt Lane");
        assert_eq!(story.username, "hueter");
        assert_eq!(story.host_name(), Some("rithmschool.com".to_string()));
        assert_eq!(story.created_at.to_rfc3339(), "2017-11-09T18:38:39.409+00:00");
    }

    #[test]
    fn partial_update_skips_unset_fields() {
        let update = StoryUpdate::default().title("New title");
        assert!(!update.is_empty());
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            serde_json::json!({ "title": "New title" })
        );
        assert!(StoryUpdate::default().is_empty());
    }
}
