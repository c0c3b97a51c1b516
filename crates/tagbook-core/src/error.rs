use serde::Serialize;

/// Stable failure categories. The HTTP layer branches on these, never on
/// the individual `CoreError` variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    NameAlreadyExists,
    InUseCannotDelete,
    NothingToUpdate,
    Busy,
    OperationFailed,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArgument => write!(f, "invalid_argument"),
            Self::NotFound => write!(f, "not_found"),
            Self::NameAlreadyExists => write!(f, "name_already_exists"),
            Self::InUseCannotDelete => write!(f, "in_use_cannot_delete"),
            Self::NothingToUpdate => write!(f, "nothing_to_update"),
            Self::Busy => write!(f, "busy"),
            Self::OperationFailed => write!(f, "operation_failed"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("user id is invalid: {0}")]
    UserIdInvalid(i64),

    #[error("transaction item id is invalid: {0}")]
    ItemIdInvalid(i64),

    #[error("transaction item group id is invalid: {0}")]
    ItemGroupIdInvalid(i64),

    #[error("transaction id is invalid: {0}")]
    TransactionIdInvalid(i64),

    #[error("item id list is invalid: {0}")]
    ItemIdListInvalid(String),

    #[error("transaction item name is empty")]
    ItemNameEmpty,

    #[error("transaction item group name is empty")]
    ItemGroupNameEmpty,

    #[error("name is longer than {max} characters")]
    NameTooLong { max: usize },

    #[error("id generator node id {0} is out of range")]
    NodeIdOutOfRange(u8),

    #[error("display order list is empty")]
    EmptyDisplayOrders,

    #[error("display order {max} leaves no room to append")]
    DisplayOrderExhausted { max: i32 },

    #[error("batch entry group id {entry} does not match batch group id {batch}")]
    BatchGroupMismatch { batch: i64, entry: i64 },

    #[error("transaction item not found: {0}")]
    ItemNotFound(i64),

    #[error("transaction item group not found: {0}")]
    ItemGroupNotFound(i64),

    #[error("transaction item index not found for transaction {0}")]
    ItemIndexNotFound(i64),

    #[error("name already exists: {0}")]
    NameAlreadyExists(String),

    #[error("transaction item is in use and cannot be deleted: {0}")]
    ItemInUse(i64),

    #[error("transaction item group is in use and cannot be deleted: {0}")]
    ItemGroupInUse(i64),

    #[error("transaction items are still referenced by transactions")]
    ItemsInUse,

    #[error("transaction item groups still contain items")]
    ItemGroupsInUse,

    #[error("nothing will be updated")]
    NothingWillBeUpdated,

    #[error("system is busy: {0}")]
    SystemBusy(String),

    #[error("unsupported schema version {found}, max supported {supported}")]
    UnsupportedSchemaVersion { found: i64, supported: i64 },

    #[error("storage failure: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UserIdInvalid(_)
            | Self::ItemIdInvalid(_)
            | Self::ItemGroupIdInvalid(_)
            | Self::TransactionIdInvalid(_)
            | Self::ItemIdListInvalid(_)
            | Self::ItemNameEmpty
            | Self::ItemGroupNameEmpty
            | Self::NameTooLong { .. }
            | Self::NodeIdOutOfRange(_)
            | Self::EmptyDisplayOrders
            | Self::DisplayOrderExhausted { .. }
            | Self::BatchGroupMismatch { .. } => ErrorKind::InvalidArgument,
            Self::ItemNotFound(_) | Self::ItemGroupNotFound(_) | Self::ItemIndexNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::NameAlreadyExists(_) => ErrorKind::NameAlreadyExists,
            Self::ItemInUse(_)
            | Self::ItemGroupInUse(_)
            | Self::ItemsInUse
            | Self::ItemGroupsInUse => ErrorKind::InUseCannotDelete,
            Self::NothingWillBeUpdated => ErrorKind::NothingToUpdate,
            Self::SystemBusy(_) => ErrorKind::Busy,
            Self::UnsupportedSchemaVersion { .. } | Self::Storage(_) | Self::Io(_) => {
                ErrorKind::OperationFailed
            }
        }
    }
}
