use serde::Serialize;
use snooze::{ApiClient, Config, NewStory, Session, StoryList, User};
use wasm_bindgen::prelude::*;
use web_sys::{console, Storage};

/// `localStorage` keys the session is kept under.
const TOKEN_KEY: &str = "token";
const USERNAME_KEY: &str = "username";

/// Install the panic hook in debug builds.
#[wasm_bindgen(start)]
pub fn start() {
    #[cfg(debug_assertions)]
    console_error_panic_hook::set_once();
}

/// All stories of the feed.
#[wasm_bindgen]
pub async fn fetch_stories() -> Result<JsValue, JsValue> {
    let stories = StoryList::fetch_all(&client()?).await.map_err(js_err)?;
    to_js(&stories.stories)
}

/// Create an account and remember its session.
#[wasm_bindgen]
pub async fn sign_up(username: String, password: String, name: String) -> Result<JsValue, JsValue> {
    let user = User::sign_up(&client()?, &username, &password, &name)
        .await
        .map_err(js_err)?;
    save_session(&user.session())?;
    to_js(&user)
}

/// Log in and remember the session.
#[wasm_bindgen]
pub async fn login(username: String, password: String) -> Result<JsValue, JsValue> {
    let user = User::login(&client()?, &username, &password)
        .await
        .map_err(js_err)?;
    save_session(&user.session())?;
    to_js(&user)
}

/// The user of the remembered session or `null`.
#[wasm_bindgen]
pub async fn current_user() -> Result<JsValue, JsValue> {
    match restore().await? {
        Some(user) => to_js(&user),
        None => Ok(JsValue::NULL),
    }
}

/// Forget the remembered session.
#[wasm_bindgen]
pub fn logout() -> Result<(), JsValue> {
    let storage = local_storage()?;
    storage.remove_item(TOKEN_KEY)?;
    storage.remove_item(USERNAME_KEY)?;
    Ok(())
}

#[wasm_bindgen]
pub async fn add_favorite(story_id: String) -> Result<JsValue, JsValue> {
    let client = client()?;
    let mut user = logged_in().await?;
    user.add_favorite(&client, &story_id).await.map_err(js_err)?;
    to_js(&user.favorites)
}

#[wasm_bindgen]
pub async fn remove_favorite(story_id: String) -> Result<JsValue, JsValue> {
    let client = client()?;
    let mut user = logged_in().await?;
    user.remove_favorite(&client, &story_id)
        .await
        .map_err(js_err)?;
    to_js(&user.favorites)
}

/// Submit a story as the logged in user and return the created story.
#[wasm_bindgen]
pub async fn add_story(title: String, author: String, url: String) -> Result<JsValue, JsValue> {
    let client = client()?;
    let mut user = logged_in().await?;
    let story = StoryList::default()
        .add_story(&client, &mut user, &NewStory::new(title, author, url))
        .await
        .map_err(js_err)?;
    to_js(&story)
}

/// Delete a story of the logged in user and return the remaining feed.
#[wasm_bindgen]
pub async fn remove_story(story_id: String) -> Result<JsValue, JsValue> {
    let client = client()?;
    let mut user = logged_in().await?;
    let mut stories = StoryList::fetch_all(&client).await.map_err(js_err)?;
    stories
        .remove_story(&client, &mut user, &story_id)
        .await
        .map_err(js_err)?;
    to_js(&stories.stories)
}

fn client() -> Result<ApiClient, JsValue> {
    ApiClient::new(Config::default()).map_err(js_err)
}

async fn restore() -> Result<Option<User>, JsValue> {
    let session = match load_session()? {
        Some(session) => session,
        None => return Ok(None),
    };
    console::log_1(&JsValue::from_str(&format!(
        "restoring session of {}",
        session.username
    )));
    User::restore(&client()?, &session).await.map_err(js_err)
}

async fn logged_in() -> Result<User, JsValue> {
    restore()
        .await?
        .ok_or_else(|| JsValue::from_str("Not logged in"))
}

fn local_storage() -> Result<Storage, JsValue> {
    web_sys::window()
        .ok_or_else(|| JsValue::from_str("No window available"))?
        .local_storage()?
        .ok_or_else(|| JsValue::from_str("localStorage is not available"))
}

fn load_session() -> Result<Option<Session>, JsValue> {
    let storage = local_storage()?;
    Ok(session_from_parts(
        storage.get_item(TOKEN_KEY)?,
        storage.get_item(USERNAME_KEY)?,
    ))
}

fn save_session(session: &Session) -> Result<(), JsValue> {
    let storage = local_storage()?;
    storage.set_item(TOKEN_KEY, &session.token)?;
    storage.set_item(USERNAME_KEY, &session.username)?;
    Ok(())
}

/// A session needs both parts, a half written one is ignored.
fn session_from_parts(token: Option<String>, username: Option<String>) -> Option<Session> {
    match (token, username) {
        (Some(token), Some(username)) if !token.is_empty() && !username.is_empty() => {
            Some(Session { username, token })
        }
        _ => None,
    }
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(JsValue::from)
}

fn js_err<E: std::fmt::Display>(err: E) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incomplete_sessions_are_ignored() {
        assert_eq!(session_from_parts(None, Some("jane".into())), None);
        assert_eq!(session_from_parts(Some("t".into()), None), None);
        assert_eq!(session_from_parts(Some("".into()), Some("jane".into())), None);
        assert_eq!(
            session_from_parts(Some("t".into()), Some("jane".into())),
            Some(Session::new("jane", "t"))
        );
    }
}
