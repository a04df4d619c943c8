/// CLMM Core Error Definitions
///
/// Every failure the engine can report is a variant of [`ErrorCode`]. Variants are numbered
/// in blocks of one hundred so the category of any returned error can be recovered from its
/// code alone:
///
/// | block     | category             |
/// |-----------|----------------------|
/// | 0..99     | `RangeError`         |
/// | 100..199  | `ArithmeticError`    |
/// | 200..299  | `InvariantViolation` |
/// | 300..399  | `PolicyViolation`    |
/// | 400..499  | `AuthorizationError` |
///
/// Anchor adds its custom error offset (6000) on top of these discriminants.
use anchor_lang::error::ERROR_CODE_OFFSET;
use anchor_lang::prelude::*;

/// Core error codes for the CLMM engine
#[error_code]
pub enum ErrorCode {
    /// Returned when a tick index lies outside `[MIN_TICK, MAX_TICK]`
    #[msg("Tick index out of range")]
    TickOutOfRange = 0,

    /// Returned when a sqrt price lies outside `[MIN_SQRT_PRICE_X64, MAX_SQRT_PRICE_X64)`
    #[msg("Sqrt price out of range")]
    PriceOutOfRange,

    /// Returned when a position's lower tick is not strictly below its upper tick
    #[msg("The provided tick range is invalid")]
    InvalidTickRange,

    /// Returned when a tick is not a multiple of the pool's tick spacing
    #[msg("Tick is not aligned to the tick spacing")]
    TickNotAligned,

    /// Returned when a tick spacing of zero (or one not matching the fee tier) is supplied
    #[msg("Invalid tick spacing")]
    InvalidTickSpacing,

    /// Returned when a fee rate lies outside `[1, 999_999]` parts per million
    #[msg("Fee rate out of range")]
    InvalidFeeRate,

    /// Returned when a protocol fee share exceeds the denominator
    #[msg("Protocol fee rate out of range")]
    InvalidProtocolFeeRate,

    /// Returned when a reward slot index is not below `REWARD_NUM`
    #[msg("Reward index out of range")]
    IndexOutOfRange,

    /// Returned when a swap price limit is on the wrong side of the current price or outside
    /// the legal price bounds
    #[msg("Sqrt price limit is invalid for this swap direction")]
    InvalidPriceLimit,

    /// Returned when an oracle query targets a time older than the oldest observation
    #[msg("Requested observation is older than the oldest stored observation")]
    ObservationTooOld,

    /// Returned when the oracle ring would grow past its maximum cardinality
    #[msg("Observation cardinality out of range")]
    ObservationCardinalityOutOfRange,

    /// Returned when an arithmetic operation overflows its representable width
    #[msg("Operation would result in math overflow")]
    MathOverflow = 100,

    /// Returned when an unsigned subtraction would go below zero
    #[msg("Operation would result in math underflow")]
    MathUnderflow,

    /// Returned when a denominator is zero
    #[msg("Division by zero")]
    DivisionByZero,

    /// Returned when a next-price computation leaves the representable width
    #[msg("Sqrt price computation overflowed")]
    PriceOverflow,

    /// Returned when a signed liquidity delta would take liquidity below zero
    #[msg("Liquidity underflow")]
    LiquidityUnderflow,

    /// Returned when a signed liquidity delta would exceed the u128 ceiling
    #[msg("Liquidity overflow")]
    LiquidityOverflow,

    /// Returned when token0 is not strictly ordered before token1
    #[msg("Token mints must be distinct and ordered token0 < token1")]
    TokenOrder = 200,

    /// Returned when a record is created under a key that already holds one
    #[msg("Account already exists")]
    AccountAlreadyExists,

    /// Returned when a record required by the operation does not exist
    #[msg("Account not found")]
    AccountNotFound,

    /// Returned when a bitmap bit and its tick's gross liquidity disagree
    #[msg("Tick bitmap does not match tick state")]
    BitmapMismatch,

    /// Returned when oracle slots are supplied out of order or for a foreign pool
    #[msg("Observation slots must be supplied in ascending order for this pool")]
    InvalidObservationSequence,

    /// Returned when a position record references a different pool or range
    #[msg("Position does not belong to this pool")]
    PositionPoolMismatch,

    /// Returned when a swap would exceed the caller's slippage tolerance
    #[msg("Slippage tolerance exceeded")]
    SlippageExceeded = 300,

    /// Returned when the caller supplied deadline has passed
    #[msg("Transaction deadline exceeded")]
    DeadlineExceeded,

    /// Returned when an amount or liquidity argument is zero
    #[msg("Amount must be greater than zero")]
    ZeroAmount,

    /// Returned when a reward window is empty or already over
    #[msg("Reward window is invalid")]
    InvalidWindow,

    /// Returned when a reward emission rate is zero
    #[msg("Reward emission rate must be positive")]
    ZeroEmission,

    /// Returned when a reward slot is configured while another schedule is still live in it
    #[msg("Reward slot is already in use")]
    RewardSlotOccupied,

    /// Returned when a reward slot has never been configured
    #[msg("Reward slot is not initialized")]
    RewardNotInitialized,

    /// Returned when removing more liquidity than a position holds
    #[msg("Position does not have enough liquidity")]
    PositionLiquidityTooLow,

    /// Returned when closing a position that still has liquidity, fees or rewards
    #[msg("Position still holds liquidity, fees or rewards")]
    PositionNotCleared,

    /// Returned when a tick would reference more liquidity than its spacing allows
    #[msg("Tick liquidity limit exceeded")]
    TickLiquidityLimitExceeded,

    /// Returned when a swap needs more tick and bitmap accounts than the configured ceiling
    #[msg("Swap touches more accounts than allowed")]
    TooManyTouchedAccounts,

    /// Returned when a pool is created with a fee tier that is not enabled
    #[msg("Fee tier is not enabled")]
    FeeTierNotEnabled,

    /// Returned when a multi-hop route is empty or its hops do not chain
    #[msg("Swap route is invalid")]
    InvalidRoute,

    /// Returned when the caller is neither the owner nor an approved delegate
    #[msg("Unauthorized access attempted")]
    UnauthorizedAccess = 400,
}

/// The five failure categories of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Tick, price or index outside legal bounds.
    RangeError,
    /// Overflow, underflow or division by zero.
    ArithmeticError,
    /// A collaborator contract breach; fatal.
    InvariantViolation,
    /// Expected and user-recoverable by retrying with new parameters.
    PolicyViolation,
    /// Owner or delegate mismatch.
    AuthorizationError,
}

impl ErrorKind {
    /// Maps a raw Anchor error number back to its category.
    pub fn from_code(code: u32) -> Option<Self> {
        let local = code.checked_sub(ERROR_CODE_OFFSET)?;
        match local / 100 {
            0 => Some(ErrorKind::RangeError),
            1 => Some(ErrorKind::ArithmeticError),
            2 => Some(ErrorKind::InvariantViolation),
            3 => Some(ErrorKind::PolicyViolation),
            4 => Some(ErrorKind::AuthorizationError),
            _ => None,
        }
    }
}

impl ErrorCode {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ErrorCode::TickOutOfRange
            | ErrorCode::PriceOutOfRange
            | ErrorCode::InvalidTickRange
            | ErrorCode::TickNotAligned
            | ErrorCode::InvalidTickSpacing
            | ErrorCode::InvalidFeeRate
            | ErrorCode::InvalidProtocolFeeRate
            | ErrorCode::IndexOutOfRange
            | ErrorCode::InvalidPriceLimit
            | ErrorCode::ObservationTooOld
            | ErrorCode::ObservationCardinalityOutOfRange => ErrorKind::RangeError,
            ErrorCode::MathOverflow
            | ErrorCode::MathUnderflow
            | ErrorCode::DivisionByZero
            | ErrorCode::PriceOverflow
            | ErrorCode::LiquidityUnderflow
            | ErrorCode::LiquidityOverflow => ErrorKind::ArithmeticError,
            ErrorCode::TokenOrder
            | ErrorCode::AccountAlreadyExists
            | ErrorCode::AccountNotFound
            | ErrorCode::BitmapMismatch
            | ErrorCode::InvalidObservationSequence
            | ErrorCode::PositionPoolMismatch => ErrorKind::InvariantViolation,
            ErrorCode::SlippageExceeded
            | ErrorCode::DeadlineExceeded
            | ErrorCode::ZeroAmount
            | ErrorCode::InvalidWindow
            | ErrorCode::ZeroEmission
            | ErrorCode::RewardSlotOccupied
            | ErrorCode::RewardNotInitialized
            | ErrorCode::PositionLiquidityTooLow
            | ErrorCode::PositionNotCleared
            | ErrorCode::TickLiquidityLimitExceeded
            | ErrorCode::TooManyTouchedAccounts
            | ErrorCode::FeeTierNotEnabled
            | ErrorCode::InvalidRoute => ErrorKind::PolicyViolation,
            ErrorCode::UnauthorizedAccess => ErrorKind::AuthorizationError,
        }
    }
}

/// Recovers the category of an error returned by the engine.
///
/// Returns `None` for errors that did not originate from [`ErrorCode`].
pub fn error_kind(err: &Error) -> Option<ErrorKind> {
    match err {
        Error::AnchorError(details) => ErrorKind::from_code(details.error_code_number),
        Error::ProgramError(_) => None,
    }
}
