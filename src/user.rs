use chrono::{DateTime, Utc};
use log::debug;
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::error::Result;
use crate::session::Session;
use crate::story::Story;

/// A user of the story service together with the token of its session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    /// The user's full name.
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Token required on every authenticated request.
    #[serde(skip_serializing)]
    pub login_token: String,
    /// Stories submitted by this user.
    pub own_stories: Vec<Story>,
    pub favorites: Vec<Story>,
}

impl User {
    /// Create a new account and return the user with its session token.
    ///
    /// A fresh account has neither own stories nor favorites.
    pub async fn sign_up(
        client: &ApiClient,
        username: &str,
        password: &str,
        name: &str,
    ) -> Result<User> {
        let url = client.endpoint(&["signup"])?;
        let resp: AuthResponse = client
            .send(
                Method::POST,
                url,
                &UserRequest {
                    user: Credentials {
                        username,
                        password,
                        name: Some(name),
                    },
                },
            )
            .await?;
        debug!("signed up {}", resp.user.username);

        let mut user = User::from_record(resp.user, resp.token);
        user.own_stories.clear();
        user.favorites.clear();
        Ok(user)
    }

    /// Log in an existing user, including its own stories and favorites.
    pub async fn login(client: &ApiClient, username: &str, password: &str) -> Result<User> {
        let url = client.endpoint(&["login"])?;
        let resp: AuthResponse = client
            .send(
                Method::POST,
                url,
                &UserRequest {
                    user: Credentials {
                        username,
                        password,
                        name: None,
                    },
                },
            )
            .await?;
        debug!("logged in {}", resp.user.username);

        Ok(User::from_record(resp.user, resp.token))
    }

    /// Fetch the user a previously issued `token` belongs to.
    ///
    /// Returns `Ok(None)` without contacting the service if the token or the
    /// username is missing or empty.
    pub async fn get_logged_in_user(
        client: &ApiClient,
        token: Option<&str>,
        username: Option<&str>,
    ) -> Result<Option<User>> {
        let (token, username) = match (token, username) {
            (Some(token), Some(username)) if !token.is_empty() && !username.is_empty() => {
                (token, username)
            }
            _ => return Ok(None),
        };

        let record = fetch_profile(client, username, token).await?;
        Ok(Some(User::from_record(record, token.to_string())))
    }

    /// Same as [`User::get_logged_in_user`] for a stored [`Session`].
    pub async fn restore(client: &ApiClient, session: &Session) -> Result<Option<User>> {
        User::get_logged_in_user(
            client,
            Some(session.token.as_str()),
            Some(session.username.as_str()),
        )
        .await
    }

    /// Re-fetch the profile and replace name, username, creation date,
    /// favorites and own stories with what the service reports.
    pub async fn retrieve_details(&mut self, client: &ApiClient) -> Result<&mut Self> {
        let record = fetch_profile(client, &self.username, &self.login_token).await?;

        self.name = record.name;
        self.username = record.username;
        self.created_at = record.created_at;
        self.favorites = record.favorites;
        self.own_stories = record.stories;
        Ok(self)
    }

    /// Mark the story as favorite and refresh the user afterwards.
    pub async fn add_favorite(&mut self, client: &ApiClient, story_id: &str) -> Result<&mut Self> {
        self.toggle_favorite(client, story_id, Method::POST).await
    }

    /// Remove the story from the favorites and refresh the user afterwards.
    pub async fn remove_favorite(
        &mut self,
        client: &ApiClient,
        story_id: &str,
    ) -> Result<&mut Self> {
        self.toggle_favorite(client, story_id, Method::DELETE).await
    }

    async fn toggle_favorite(
        &mut self,
        client: &ApiClient,
        story_id: &str,
        method: Method,
    ) -> Result<&mut Self> {
        let url = client.endpoint(&["users", self.username.as_str(), "favorites", story_id])?;
        client
            .send_discard(
                method,
                url,
                &TokenRequest {
                    token: &self.login_token,
                },
            )
            .await?;

        self.retrieve_details(client).await
    }

    pub fn is_favorite(&self, story_id: &str) -> bool {
        self.favorites.iter().any(|s| s.story_id == story_id)
    }

    pub fn is_own_story(&self, story_id: &str) -> bool {
        self.own_stories.iter().any(|s| s.story_id == story_id)
    }

    /// Send a partial update of the account.
    ///
    /// Only the `name` of the response is applied locally.
    pub async fn update(&mut self, client: &ApiClient, update: &UserUpdate) -> Result<&mut Self> {
        let url = client.endpoint(&["users", self.username.as_str()])?;
        let resp: UserResponse = client
            .send(
                Method::PATCH,
                url,
                &UserUpdateRequest {
                    user: update,
                    token: &self.login_token,
                },
            )
            .await?;

        self.name = resp.user.name;
        Ok(self)
    }

    /// Delete the account.
    ///
    /// The local value is left as is, dropping it is up to the caller.
    pub async fn remove(&self, client: &ApiClient) -> Result<()> {
        let url = client.endpoint(&["users", self.username.as_str()])?;
        client
            .send_discard(
                Method::DELETE,
                url,
                &TokenRequest {
                    token: &self.login_token,
                },
            )
            .await
    }

    /// The credentials to restore this user later on.
    pub fn session(&self) -> Session {
        Session::new(&self.username, &self.login_token)
    }

    /// Drop every local copy of the story.
    pub(crate) fn forget_story(&mut self, story_id: &str) {
        self.own_stories.retain(|s| s.story_id != story_id);
        self.favorites.retain(|s| s.story_id != story_id);
    }

    fn from_record(record: UserRecord, login_token: String) -> Self {
        User {
            username: record.username,
            name: record.name,
            created_at: record.created_at,
            updated_at: record.updated_at,
            login_token,
            own_stories: record.stories,
            favorites: record.favorites,
        }
    }
}

async fn fetch_profile(client: &ApiClient, username: &str, token: &str) -> Result<UserRecord> {
    let url = client.endpoint(&["users", username])?;
    let resp: UserResponse = client.get(url, &[("token", token)]).await?;
    Ok(resp.user)
}

/// Partial update of an account, unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl UserUpdate {
    pub fn name<T: ToString>(mut self, name: T) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn password<T: ToString>(mut self, password: T) -> Self {
        self.password = Some(password.to_string());
        self
    }
}

/// Body of requests that only need to prove the session.
#[derive(Debug, Serialize)]
pub(crate) struct TokenRequest<'a> {
    pub token: &'a str,
}

#[derive(Debug, Serialize)]
struct UserRequest<'a> {
    user: Credentials<'a>,
}

#[derive(Debug, Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct UserUpdateRequest<'a> {
    user: &'a UserUpdate,
    token: &'a str,
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    user: UserRecord,
    token: String,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    user: UserRecord,
}

/// A user as embedded in the service's responses.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserRecord {
    username: String,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default)]
    favorites: Vec<Story>,
    #[serde(default)]
    stories: Vec<Story>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story(id: &str) -> Story {
        serde_json::from_value(serde_json::json!({
            "storyId": id,
            "title": "title",
            "author": "author",
            "url": "https://example.com",
            "username": "jane",
            "createdAt": "2020-01-01T00:00:00.000Z",
            "updatedAt": "2020-01-01T00:00:00.000Z"
        }))
        .unwrap()
    }

    #[test]
    fn decode_record_maps_stories_to_own_stories() {
        let record: UserRecord = serde_json::from_value(serde_json::json!({
            "username": "jane",
            "name": "Jane Doe",
            "createdAt": "2020-01-01T00:00:00.000Z",
            "updatedAt": "2020-01-02T00:00:00.000Z",
            "favorites": [],
            "stories": [{
                "storyId": "s1",
                "title": "title",
                "author": "author",
                "url": "https://example.com",
                "username": "jane",
                "createdAt": "2020-01-01T00:00:00.000Z",
                "updatedAt": "2020-01-01T00:00:00.000Z"
            }]
        }))
        .unwrap();
        let user = User::from_record(record, "token".to_string());
        assert_eq!(user.own_stories.len(), 1);
        assert!(user.is_own_story("s1"));
        assert!(user.favorites.is_empty());
        assert_eq!(user.session(), Session::new("jane", "token"));
    }

    #[test]
    fn forget_story_drops_all_copies() {
        let record: UserRecord = serde_json::from_value(serde_json::json!({
            "username": "jane",
            "name": "Jane Doe",
            "createdAt": "2020-01-01T00:00:00.000Z",
            "updatedAt": "2020-01-01T00:00:00.000Z"
        }))
        .unwrap();
        let mut user = User::from_record(record, "token".to_string());
        user.own_stories = vec![story("a"), story("b")];
        user.favorites = vec![story("b"), story("c")];

        user.forget_story("b");
        assert!(user.is_own_story("a"));
        assert!(!user.is_own_story("b"));
        assert!(!user.is_favorite("b"));
        assert!(user.is_favorite("c"));
    }

    #[test]
    fn token_is_not_serialized() {
        let record: UserRecord = serde_json::from_value(serde_json::json!({
            "username": "jane",
            "name": "Jane Doe",
            "createdAt": "2020-01-01T00:00:00.000Z",
            "updatedAt": "2020-01-01T00:00:00.000Z"
        }))
        .unwrap();
        let user = User::from_record(record, "secret".to_string());
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains("ownStories"));
    }
}
