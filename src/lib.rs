//! Client for the hack-or-snooze news story service.
//!
//! Every operation takes an [`ApiClient`] and, where authentication is
//! needed, a [`User`] carrying the session token. Local lists are only
//! changed after the service confirmed the request.
//!
//! ```no_run
//! # async fn run() -> snooze::Result<()> {
//! use snooze::{ApiClient, Config, NewStory, StoryList, User};
//!
//! let client = ApiClient::new(Config::default())?;
//! let mut stories = StoryList::fetch_all(&client).await?;
//! let mut user = User::login(&client, "jane", "hunter2").await?;
//!
//! let story = stories
//!     .add_story(&client, &mut user, &NewStory::new("Title", "Jane", "https://example.com"))
//!     .await?;
//! user.add_favorite(&client, &story.story_id).await?;
//! # Ok(())
//! # }
//! ```

pub use client::{ApiClient, Config, ConfigBuilder};
pub use error::{Result, SnoozeError};
pub use session::Session;
#[cfg(not(target_arch = "wasm32"))]
pub use session::SessionStore;
pub use story::{NewStory, Story, StoryUpdate};
pub use story_list::StoryList;
pub use user::{User, UserUpdate};

pub mod client;
mod error;
pub mod session;
pub mod story;
pub mod story_list;
pub mod user;
