use std::slice::Iter;

use log::debug;
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::error::Result;
use crate::story::{NewStory, Story, StoryRequest, StoryResponse};
use crate::user::{TokenRequest, User};

/// The stories known to the client, newest first as long as the service
/// returns them that way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoryList {
    pub stories: Vec<Story>,
}

impl StoryList {
    pub fn new(stories: Vec<Story>) -> Self {
        Self { stories }
    }

    /// Fetch the story feed. No authentication required.
    pub async fn fetch_all(client: &ApiClient) -> Result<StoryList> {
        let url = client.endpoint(&["stories"])?;
        let resp: StoriesResponse = client.get(url, &[]).await?;
        debug!("fetched {} stories", resp.stories.len());
        Ok(StoryList::new(resp.stories))
    }

    /// Submit `new_story` as `user`.
    ///
    /// The story the service created is put in front of this list and of the
    /// user's own stories and then returned.
    pub async fn add_story(
        &mut self,
        client: &ApiClient,
        user: &mut User,
        new_story: &NewStory,
    ) -> Result<Story> {
        let url = client.endpoint(&["stories"])?;
        let resp: StoryResponse = client
            .send(
                Method::POST,
                url,
                &StoryRequest {
                    token: &user.login_token,
                    story: new_story,
                },
            )
            .await?;

        let story = resp.story;
        debug!("created story {}", story.story_id);
        self.stories.insert(0, story.clone());
        user.own_stories.insert(0, story.clone());
        Ok(story)
    }

    /// Delete the story as `user`.
    ///
    /// Once the service confirmed, the story is dropped from this list and
    /// from the user's own stories and favorites.
    pub async fn remove_story(
        &mut self,
        client: &ApiClient,
        user: &mut User,
        story_id: &str,
    ) -> Result<()> {
        let url = client.endpoint(&["stories", story_id])?;
        client
            .send_discard(
                Method::DELETE,
                url,
                &TokenRequest {
                    token: &user.login_token,
                },
            )
            .await?;

        debug!("deleted story {}", story_id);
        self.forget(story_id);
        user.forget_story(story_id);
        Ok(())
    }

    /// Drop the story from this list only.
    fn forget(&mut self, story_id: &str) {
        self.stories.retain(|s| s.story_id != story_id);
    }

    pub fn get(&self, story_id: &str) -> Option<&Story> {
        self.stories.iter().find(|s| s.story_id == story_id)
    }

    pub fn get_mut(&mut self, story_id: &str) -> Option<&mut Story> {
        self.stories.iter_mut().find(|s| s.story_id == story_id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.stories.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stories.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> Iter<'_, Story> {
        self.stories.iter()
    }

    pub fn into_inner(self) -> Vec<Story> {
        self.stories
    }
}

impl From<Vec<Story>> for StoryList {
    fn from(stories: Vec<Story>) -> Self {
        StoryList::new(stories)
    }
}

impl<'a> IntoIterator for &'a StoryList {
    type Item = &'a Story;
    type IntoIter = Iter<'a, Story>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug, Deserialize)]
struct StoriesResponse {
    stories: Vec<Story>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story(id: &str) -> Story {
        serde_json::from_value(serde_json::json!({
            "storyId": id,
            "title": format!("title {}", id),
            "author": "author",
            "url": "https://example.com",
            "username": "jane",
            "createdAt": "2020-01-01T00:00:00.000Z",
            "updatedAt": "2020-01-01T00:00:00.000Z"
        }))
        .unwrap()
    }

    #[test]
    fn lookup_and_forget() {
        let mut list = StoryList::from(vec![story("a"), story("b"), story("a")]);
        assert_eq!(list.len(), 3);
        assert_eq!(list.get("b").map(|s| s.title.as_str()), Some("title b"));
        assert!(list.get("z").is_none());

        list.forget("a");
        assert_eq!(list.len(), 1);
        assert_eq!(
            list.iter().map(|s| s.story_id.as_str()).collect::<Vec<_>>(),
            vec!["b"]
        );

        list.forget("b");
        assert!(list.is_empty());
    }
}
