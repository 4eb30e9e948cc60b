use askama::Template;

use crate::models::profile::Profile;
use super::PageContext;

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
    pub flash: Option<String>,
    pub email: String,
    pub app_name: String,
    pub csrf_token: String,
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub errors: Vec<String>,
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub app_name: String,
    pub csrf_token: String,
}

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub ctx: PageContext,
    pub profile: Profile,
}

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub ctx: PageContext,
    pub profile: Profile,
    pub errors: Vec<String>,
    pub max_avatar_kb: usize,
}
