use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use structopt::StructOpt;

use snooze::{
    ApiClient, Config, NewStory, Session, SessionStore, StoryList, StoryUpdate, User, UserUpdate,
};

#[allow(missing_docs)]
#[derive(Debug, StructOpt)]
#[structopt(name = "hack-or-snooze", about = "Read, post and favorite stories.")]
struct App {
    #[structopt(flatten)]
    opts: Opts,
    #[structopt(subcommand)]
    cmd: Cmd,
}

#[derive(Debug, Clone, StructOpt)]
struct Opts {
    #[structopt(long = "base-url", help = "Root url of the story service.")]
    base_url: Option<String>,
    #[structopt(long = "timeout", help = "Timeout for each request in seconds.")]
    timeout: Option<u64>,
    #[structopt(long = "user-agent", help = "The user-agent used for requests.")]
    user_agent: Option<String>,
    #[structopt(
        long = "session-dir",
        help = "Directory the login session is kept in.",
        default_value = ".hack-or-snooze",
        parse(from_os_str)
    )]
    session_dir: PathBuf,
}

impl Opts {
    fn as_config(&self) -> Config {
        let mut config = Config::builder();
        if let Some(base_url) = self.base_url.clone() {
            config = config.base_url(base_url);
        }
        if let Some(timeout) = self.timeout {
            config = config.request_timeout(Duration::from_secs(timeout));
        }
        if let Some(user_agent) = self.user_agent.clone() {
            config = config.user_agent(user_agent);
        }
        config.build()
    }
}

#[derive(Debug, StructOpt)]
enum Cmd {
    #[structopt(name = "stories", about = "List all stories.")]
    Stories,
    #[structopt(name = "signup", about = "Create an account and log in.")]
    Signup {
        username: String,
        password: String,
        #[structopt(help = "Your full name.")]
        name: String,
    },
    #[structopt(name = "login", about = "Log in to an existing account.")]
    Login { username: String, password: String },
    #[structopt(name = "logout", about = "Forget the stored session.")]
    Logout,
    #[structopt(name = "whoami", about = "Show the logged in user.")]
    Whoami,
    #[structopt(name = "post", about = "Submit a new story.")]
    Post {
        #[structopt(long = "title")]
        title: String,
        #[structopt(long = "author")]
        author: String,
        #[structopt(long = "url")]
        url: String,
    },
    #[structopt(name = "edit", about = "Change a story you submitted.")]
    Edit {
        story_id: String,
        #[structopt(long = "title")]
        title: Option<String>,
        #[structopt(long = "author")]
        author: Option<String>,
        #[structopt(long = "url")]
        url: Option<String>,
    },
    #[structopt(name = "delete", about = "Delete a story you submitted.")]
    Delete { story_id: String },
    #[structopt(name = "favorite", about = "Add a story to your favorites.")]
    Favorite { story_id: String },
    #[structopt(name = "unfavorite", about = "Remove a story from your favorites.")]
    Unfavorite { story_id: String },
    #[structopt(name = "rename", about = "Change your full name.")]
    Rename { name: String },
    #[structopt(name = "delete-account", about = "Delete your account for good.")]
    DeleteAccount,
}

impl App {
    async fn run(self) -> Result<()> {
        let client = ApiClient::new(self.opts.as_config())?;
        let store = SessionStore::new(&self.opts.session_dir);

        match self.cmd {
            Cmd::Stories => {
                let stories = StoryList::fetch_all(&client).await?;
                write(&stories.stories)
            }
            Cmd::Signup {
                username,
                password,
                name,
            } => {
                let user = User::sign_up(&client, &username, &password, &name)
                    .await
                    .context("Sign up failed")?;
                store.save(&user.session()).await?;
                write(&user)
            }
            Cmd::Login { username, password } => {
                let user = User::login(&client, &username, &password)
                    .await
                    .context("Login failed")?;
                store.save(&user.session()).await?;
                write(&user)
            }
            Cmd::Logout => Ok(store.clear().await?),
            Cmd::Whoami => write(&current_user(&client, &store).await?),
            Cmd::Post { title, author, url } => {
                let mut user = current_user(&client, &store).await?;
                let story = StoryList::default()
                    .add_story(&client, &mut user, &NewStory::new(title, author, url))
                    .await
                    .context("Adding story failed")?;
                write(&story)
            }
            Cmd::Edit {
                story_id,
                title,
                author,
                url,
            } => {
                let update = StoryUpdate {
                    title,
                    author,
                    url,
                };
                anyhow::ensure!(!update.is_empty(), "Nothing to change");

                let user = current_user(&client, &store).await?;
                let mut stories = StoryList::fetch_all(&client).await?;
                let story = stories
                    .get_mut(&story_id)
                    .with_context(|| format!("No story with id {}", story_id))?;
                story
                    .update(&client, &user, &update)
                    .await
                    .context("Updating story failed")?;
                write(&*story)
            }
            Cmd::Delete { story_id } => {
                let mut user = current_user(&client, &store).await?;
                StoryList::default()
                    .remove_story(&client, &mut user, &story_id)
                    .await
                    .context("Deleting story failed")?;
                Ok(())
            }
            Cmd::Favorite { story_id } => {
                let mut user = current_user(&client, &store).await?;
                user.add_favorite(&client, &story_id).await?;
                write(&user.favorites)
            }
            Cmd::Unfavorite { story_id } => {
                let mut user = current_user(&client, &store).await?;
                user.remove_favorite(&client, &story_id).await?;
                write(&user.favorites)
            }
            Cmd::Rename { name } => {
                let mut user = current_user(&client, &store).await?;
                user.update(&client, &UserUpdate::default().name(name)).await?;
                write(&user)
            }
            Cmd::DeleteAccount => {
                let user = current_user(&client, &store).await?;
                user.remove(&client).await?;
                Ok(store.clear().await?)
            }
        }
    }
}

/// Restore the user of the stored session.
async fn current_user(client: &ApiClient, store: &SessionStore) -> Result<User> {
    let session: Option<Session> = store.load().await?;
    let session = session.context("Not logged in, run `login` or `signup` first")?;
    User::restore(client, &session)
        .await
        .with_context(|| format!("Failed to restore session of {}", session.username))?
        .context("Stored session is incomplete")
}

/// Writes the value as pretty json to std::out.
fn write<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    Ok(App::from_args().run().await?)
}
