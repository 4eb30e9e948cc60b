use askama::Template;

use crate::models::attendance::AttendanceRecord;
use crate::models::meeting::Meeting;
use super::PageContext;

/// Admin view: manager for the active meeting plus history.
#[derive(Template)]
#[template(path = "meetings/admin.html")]
pub struct MeetingsAdminTemplate {
    pub ctx: PageContext,
    pub active: Option<Meeting>,
    pub qr_svg: Option<String>,
    pub attendees: Vec<AttendanceRecord>,
    pub history: Vec<Meeting>,
    pub date_filter: String,
    pub errors: Vec<String>,
    pub form_name: String,
    pub form_leader: String,
}

/// Member view: the check-in scanner.
#[derive(Template)]
#[template(path = "meetings/member.html")]
pub struct MeetingsMemberTemplate {
    pub ctx: PageContext,
    pub active: Option<Meeting>,
    pub checked_in: Option<AttendanceRecord>,
}

#[derive(Template)]
#[template(path = "meetings/detail.html")]
pub struct MeetingDetailTemplate {
    pub ctx: PageContext,
    pub meeting: Meeting,
    pub attendees: Vec<AttendanceRecord>,
}
