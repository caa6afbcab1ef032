use rocket::{
    http::{Cookie, CookieJar},
    serde::json::Json,
    Route, State,
};

use crate::{
    error::Result,
    model::{
        api::{
            auth::{
                AuthToken, ChangePasswordRequest, Credentials, LoginResponse, RegisterRequest,
                AUTH_TOKEN_COOKIE,
            },
            user::UserDescription,
        },
        db::user::{User, UserCore},
        mongodb::Coll,
    },
    Config,
};

pub fn routes() -> Vec<Route> {
    routes![register, login, logout, change_password]
}

#[post("/register", data = "<request>", format = "json")]
pub async fn register(
    request: Json<RegisterRequest>,
    users: Coll<User>,
    config: &State<Config>,
) -> Result<Json<UserDescription>> {
    let user = UserCore::register(request.0, config.registration())?;
    let user = User::insert(&users, user).await?;
    info!("Registered {} as {}", user.username, user.role);
    Ok(Json(user.into()))
}

#[post("/login", data = "<credentials>", format = "json")]
pub async fn login(
    cookies: &CookieJar<'_>,
    credentials: Json<Credentials>,
    users: Coll<User>,
    config: &State<Config>,
) -> Result<Json<LoginResponse>> {
    let user = User::authenticate(&users, &credentials).await?;

    let token = AuthToken::new(&user);
    cookies.add(token.into_cookie(config)?);

    Ok(Json(LoginResponse::from(&user)))
}

#[delete("/login")]
pub async fn logout(cookies: &CookieJar<'_>) {
    cookies.remove(Cookie::named(AUTH_TOKEN_COOKIE));
}

#[post("/change_password", data = "<request>", format = "json")]
pub async fn change_password(
    request: Json<ChangePasswordRequest>,
    users: Coll<User>,
) -> Result<()> {
    let username = request.username.clone();
    User::change_password(&users, request.0).await?;
    info!("Changed password for {username}");
    Ok(())
}
