use askama::Template;

use crate::models::profile::Profile;
use super::PageContext;

#[derive(Template)]
#[template(path = "members.html")]
pub struct MembersTemplate {
    pub ctx: PageContext,
    pub members: Vec<Profile>,
}
