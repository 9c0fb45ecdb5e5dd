use std::fmt;

/// The table layout cannot hold the roster, or a strategy refuses the problem size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    NoTables,
    ZeroCapacity,
    InsufficientSeats { guests: usize, seats: usize },
    TooManyTables { tables: usize, guests: usize },
    TooManyGuests { guests: usize, limit: usize },
    /// A strategy tunable is out of range.
    InvalidParameter { name: String, reason: String },
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::NoTables => write!(f, "at least one table is required"),
            ConfigurationError::ZeroCapacity => write!(f, "table capacity must be positive"),
            ConfigurationError::InsufficientSeats { guests, seats } => {
                write!(f, "{guests} guests do not fit into {seats} seats")
            }
            ConfigurationError::TooManyTables { tables, guests } => {
                write!(f, "{tables} tables cannot exceed the number of guests ({guests})")
            }
            ConfigurationError::TooManyGuests { guests, limit } => {
                write!(f, "{guests} guests exceed the limit of {limit}")
            }
            ConfigurationError::InvalidParameter { name, reason } => {
                write!(f, "`{name}` {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigurationError {}

/// A construction strategy ran out of seats before every guest was placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapacityError {
    pub guest: String,
    pub seated: usize,
    pub total: usize,
}

impl fmt::Display for CapacityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "all tables are full before seating `{}` ({} of {} guests seated)",
            self.guest, self.seated, self.total
        )
    }
}

impl std::error::Error for CapacityError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStrategyError {
    pub name: String,
}

impl fmt::Display for UnknownStrategyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown strategy `{}`", self.name)
    }
}

impl std::error::Error for UnknownStrategyError {}

/// A seating plan assembled from outside data breaks a partition invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidPlanError {
    UnknownGuest(String),
    MissingGuest(String),
    DuplicatedGuest(String),
    OverCapacity {
        table: usize,
        size: usize,
        capacity: usize,
    },
    /// The plan was laid out for a different problem.
    LayoutMismatch {
        tables: usize,
        capacity: usize,
        expected_tables: usize,
        expected_capacity: usize,
    },
    ForeignRoster,
}

impl fmt::Display for InvalidPlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidPlanError::UnknownGuest(name) => write!(f, "guest `{name}` is not on the roster"),
            InvalidPlanError::MissingGuest(name) => write!(f, "guest `{name}` is not seated"),
            InvalidPlanError::DuplicatedGuest(name) => {
                write!(f, "guest `{name}` is seated more than once")
            }
            InvalidPlanError::OverCapacity {
                table,
                size,
                capacity,
            } => write!(f, "table {table} seats {size} guests but holds {capacity}"),
            InvalidPlanError::LayoutMismatch {
                tables,
                capacity,
                expected_tables,
                expected_capacity,
            } => write!(
                f,
                "plan has {tables} tables of {capacity}, problem has {expected_tables} of {expected_capacity}"
            ),
            InvalidPlanError::ForeignRoster => {
                write!(f, "plan was built for another roster")
            }
        }
    }
}

impl std::error::Error for InvalidPlanError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeatingError {
    Configuration(ConfigurationError),
    Capacity(CapacityError),
    UnknownStrategy(UnknownStrategyError),
    InvalidPlan(InvalidPlanError),
    Unsolved(String),
}

impl From<ConfigurationError> for SeatingError {
    fn from(e: ConfigurationError) -> Self {
        SeatingError::Configuration(e)
    }
}

impl From<CapacityError> for SeatingError {
    fn from(e: CapacityError) -> Self {
        SeatingError::Capacity(e)
    }
}

impl From<UnknownStrategyError> for SeatingError {
    fn from(e: UnknownStrategyError) -> Self {
        SeatingError::UnknownStrategy(e)
    }
}

impl From<InvalidPlanError> for SeatingError {
    fn from(e: InvalidPlanError) -> Self {
        SeatingError::InvalidPlan(e)
    }
}

impl fmt::Display for SeatingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeatingError::Configuration(e) => write!(f, "configuration: {e}"),
            SeatingError::Capacity(e) => write!(f, "capacity: {e}"),
            SeatingError::UnknownStrategy(e) => write!(f, "strategy: {e}"),
            SeatingError::InvalidPlan(e) => write!(f, "invalid plan: {e}"),
            SeatingError::Unsolved(solver) => {
                write!(f, "{solver}: finished without a complete seating plan")
            }
        }
    }
}

impl std::error::Error for SeatingError {}

// The file layer works in `std::io::Result`, like the rest of the CLI.
impl From<SeatingError> for std::io::Error {
    fn from(e: SeatingError) -> Self {
        std::io::Error::new(std::io::ErrorKind::InvalidData, e)
    }
}
