//! Team features around the scheduler
//!
//! Member directory, announcement board, prayer wall, weekly set-lists,
//! song library, meeting minutes, surveys, the team calendar and the
//! service-record archive. Each service wraps one collection; deletes go
//! through the session's permission check.

pub mod announcements;
pub mod archive;
pub mod events;
pub mod meetings;
pub mod members;
pub mod prayers;
pub mod setlists;
pub mod songs;
pub mod surveys;

pub use announcements::{AnnouncementBoard, AnnouncementFeed};
pub use archive::ServiceArchive;
pub use events::{CalendarDay, TeamCalendar};
pub use meetings::MeetingMinutes;
pub use members::{Executive, GroupedMembers, MemberDirectory, MemberQuery};
pub use prayers::PrayerWall;
pub use setlists::{SetlistDraft, SetlistPlanner};
pub use songs::SongLibrary;
pub use surveys::SurveyBoard;

use crate::store::SharedDocumentStore;

/// All team services over one store
pub struct Team {
    pub members: MemberDirectory,
    pub announcements: AnnouncementBoard,
    pub prayers: PrayerWall,
    pub setlists: SetlistPlanner,
    pub songs: SongLibrary,
    pub meetings: MeetingMinutes,
    pub surveys: SurveyBoard,
    pub events: TeamCalendar,
    pub archive: ServiceArchive,
}

impl Team {
    pub fn new(store: SharedDocumentStore, list_limit: usize) -> Self {
        Self {
            members: MemberDirectory::new(store.clone()).with_list_limit(list_limit),
            announcements: AnnouncementBoard::new(store.clone()).with_list_limit(list_limit),
            prayers: PrayerWall::new(store.clone()).with_list_limit(list_limit),
            setlists: SetlistPlanner::new(store.clone()),
            songs: SongLibrary::new(store.clone()).with_list_limit(list_limit),
            meetings: MeetingMinutes::new(store.clone()).with_list_limit(list_limit),
            surveys: SurveyBoard::new(store.clone()).with_list_limit(list_limit),
            events: TeamCalendar::new(store.clone()).with_list_limit(list_limit),
            archive: ServiceArchive::new(store).with_list_limit(list_limit),
        }
    }
}
