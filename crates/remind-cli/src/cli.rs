use clap::{Args, Parser, Subcommand, ValueEnum};
use remind_core::calendar::Locale;
use remind_core::models::{GroupId, RecurrencePattern, ReminderId, ReminderType, UserId};

/// Recurring, shared and location-aware reminders from the terminal
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Act as this user (overrides the configured user)
    #[arg(long, global = true)]
    pub user: Option<UserId>,

    /// Log engine activity to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Manage users
    User(UserCommand),
    /// Add a new reminder
    Add(AddCommand),
    /// List every reminder visible to you
    List(ListCommand),
    /// Show one reminder with its sharing details
    Show(ShowCommand),
    /// Edit a reminder
    Edit(EditCommand),
    /// Mark a reminder as done (recurring reminders renew)
    Done(DoneCommand),
    /// Delete a reminder you own
    Delete(DeleteCommand),
    /// Manage recurrence of a reminder
    Recur(RecurCommand),
    /// Share a reminder with a friend or a group
    Share(ShareCommand),
    /// Stop sharing a reminder
    Unshare(ShareCommand),
    /// Manage friends
    Friend(FriendCommand),
    /// Manage groups
    Group(GroupCommand),
    /// Show a month of reminders
    Calendar(CalendarCommand),
    /// Watch for due and nearby reminders until interrupted
    Watch(WatchCommand),
}

#[derive(Args, Debug, Clone)]
pub struct UserCommand {
    #[command(subcommand)]
    pub command: UserSubcommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum UserSubcommand {
    /// Register a user
    Add {
        name: String,
        email: String,
    },
}

#[derive(Parser, Debug, Clone)]
pub struct AddCommand {
    /// The title of the reminder
    pub title: String,
    #[arg(short, long)]
    pub description: Option<String>,
    /// When to fire (e.g. "2025-01-01 09:00", "tomorrow 9am")
    #[arg(long)]
    pub at: Option<String>,
    /// Where to fire; the address is geocoded
    #[arg(long)]
    pub address: Option<String>,
    /// Reminder kind; inferred from --at/--address when omitted
    #[arg(long = "type", value_enum)]
    pub reminder_type: Option<TypeArg>,
    /// Repeat the reminder
    #[arg(long, value_enum)]
    pub every: Option<PatternArg>,
    /// Last instant a renewal may land on
    #[arg(long, requires = "every")]
    pub until: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct ListCommand {
    /// Only reminders others share with you
    #[arg(long)]
    pub shared: bool,
    /// Hide completed reminders
    #[arg(long)]
    pub open: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct ShowCommand {
    pub id: ReminderId,
}

#[derive(Parser, Debug, Clone)]
pub struct EditCommand {
    /// The ID of the reminder to edit
    pub id: ReminderId,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub description: Option<String>,
    #[arg(long, conflicts_with = "description")]
    pub description_clear: bool,

    #[arg(long)]
    pub at: Option<String>,

    #[arg(long)]
    pub address: Option<String>,

    /// Mark as notified (or not)
    #[arg(long)]
    pub notified: Option<bool>,

    /// Reopen a completed reminder
    #[arg(long)]
    pub reopen: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct DoneCommand {
    pub id: ReminderId,
}

#[derive(Parser, Debug, Clone)]
pub struct DeleteCommand {
    pub id: ReminderId,
    /// Force deletion without confirmation
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug, Clone)]
pub struct RecurCommand {
    #[command(subcommand)]
    pub command: RecurSubcommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum RecurSubcommand {
    /// Make a reminder recurring or change its pattern
    Set {
        id: ReminderId,
        #[arg(value_enum)]
        pattern: PatternArg,
        #[arg(long)]
        until: Option<String>,
    },
    /// Turn a reminder back into a one-off
    Clear { id: ReminderId },
    /// Preview upcoming occurrences
    Preview {
        id: ReminderId,
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ShareCommand {
    pub id: ReminderId,
    #[command(subcommand)]
    pub target: ShareTarget,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ShareTarget {
    /// A friend, directly
    Friend {
        friend_id: UserId,
        /// Let the friend edit content
        #[arg(long)]
        can_edit: bool,
    },
    /// Every member of a group
    Group { group_id: GroupId },
}

#[derive(Args, Debug, Clone)]
pub struct FriendCommand {
    #[command(subcommand)]
    pub command: FriendSubcommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum FriendSubcommand {
    /// Send a friend request
    Request { user_id: UserId },
    /// Accept a pending request
    Accept { request_id: i64 },
    /// Reject a pending request
    Reject { request_id: i64 },
    /// List friends
    List,
    /// List requests waiting for your answer
    Pending,
}

#[derive(Args, Debug, Clone)]
pub struct GroupCommand {
    #[command(subcommand)]
    pub command: GroupSubcommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum GroupSubcommand {
    /// Create a group you own
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Add a friend to a group you administer
    AddMember { group_id: GroupId, user_id: UserId },
    /// Remove a member, or leave the group
    RemoveMember { group_id: GroupId, user_id: UserId },
    /// List your groups
    List,
    /// List the members of a group
    Members { group_id: GroupId },
}

#[derive(Parser, Debug, Clone)]
pub struct CalendarCommand {
    /// Month to show as YYYY-MM (defaults to the current month)
    #[arg(long)]
    pub month: Option<String>,
    /// Label language (en, es)
    #[arg(long)]
    pub locale: Option<Locale>,
}

#[derive(Parser, Debug, Clone)]
pub struct WatchCommand {
    /// Current latitude; enables proximity notifications with --lng
    #[arg(long, requires = "lng", allow_hyphen_values = true)]
    pub lat: Option<f64>,
    /// Current longitude
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub lng: Option<f64>,
    /// Geofencing radius in kilometres
    #[arg(long)]
    pub radius_km: Option<f64>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternArg {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl From<PatternArg> for RecurrencePattern {
    fn from(arg: PatternArg) -> Self {
        match arg {
            PatternArg::Daily => RecurrencePattern::Daily,
            PatternArg::Weekly => RecurrencePattern::Weekly,
            PatternArg::Monthly => RecurrencePattern::Monthly,
            PatternArg::Yearly => RecurrencePattern::Yearly,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeArg {
    Datetime,
    Location,
    Both,
}

impl From<TypeArg> for ReminderType {
    fn from(arg: TypeArg) -> Self {
        match arg {
            TypeArg::Datetime => ReminderType::Datetime,
            TypeArg::Location => ReminderType::Location,
            TypeArg::Both => ReminderType::Both,
        }
    }
}
