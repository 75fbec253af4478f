//! Backup database schema definitions
//!
//! Column names of the `message` relation found in iPhone backup stores
//! (`3d0d7e5fb2ce288813306e4d4636395e047a3d28` in the backup folder). Two
//! generations of this table exist; see [`crate::normalize`].

/// Messages table schema
pub mod message {
    /// Table name
    pub const TABLE: &str = "message";
    /// Unique identifier column
    pub const GUID: &str = "guid";
    /// Message date column
    pub const DATE: &str = "date";
    /// Message text column
    pub const TEXT: &str = "text";
    /// Subject line column
    pub const SUBJECT: &str = "subject";
    /// Counterpart phone number or address column
    pub const ADDRESS: &str = "address";

    /// Legacy-only columns
    pub mod legacy {
        /// Non-zero when the row is an iMessage; its presence marks the legacy schema
        pub const IS_MADRID: &str = "is_madrid";
        /// iMessage direction/status code
        pub const MADRID_FLAGS: &str = "madrid_flags";
        /// SMS direction/status code
        pub const FLAGS: &str = "flags";
        /// iMessage counterpart handle
        pub const MADRID_HANDLE: &str = "madrid_handle";
        /// iMessage unique identifier; SMS rows leave it null
        pub const MADRID_GUID: &str = "madrid_guid";

        /// `madrid_flags` values observed on sent iMessages.
        ///
        /// 77825 (received, parsed data) and 102405 (sent, parsed data) are
        /// known codes that are left out; those rows read as received.
        pub const MADRID_FLAGS_SENT: [i64; 2] = [36869, 45061];
        /// `flags` values observed on sent SMS
        pub const SMS_FLAGS_SENT: [i64; 2] = [3, 35];
    }

    /// Modern-only columns
    pub mod modern {
        /// Boolean sent flag
        pub const IS_SENT: &str = "is_sent";
        /// Service name (`iMessage`, `SMS`)
        pub const SERVICE: &str = "service";
        /// Owner account used when `address` is empty
        pub const ACCOUNT: &str = "account";
    }
}

/// Seconds between 1970-01-01 and 2001-01-01, the epoch of legacy dates
pub const MADRID_OFFSET: i64 = 978_307_200;

/// File name of the SMS database inside an iTunes/Finder backup
pub const SMS_DB_BACKUP_NAME: &str = "3d0d7e5fb2ce288813306e4d4636395e047a3d28";
