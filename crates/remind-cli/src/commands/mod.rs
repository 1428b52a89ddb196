pub mod add;
pub mod calendar;
pub mod delete;
pub mod done;
pub mod edit;
pub mod friend;
pub mod group;
pub mod list;
pub mod recurrence;
pub mod share;
pub mod user;
pub mod watch;
