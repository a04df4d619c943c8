use super::{assert_error, mock_pubkey};
use crate::config::AmmConfig;
use crate::constants::*;
use crate::errors::ErrorCode;

#[test]
fn test_default_fee_tiers() {
    let config = AmmConfig::new(mock_pubkey(1));
    assert_eq!(config.protocol_fee_rate, DEFAULT_PROTOCOL_FEE_RATE);
    assert_eq!(config.max_touched_ticks, None);
    assert_eq!(config.tick_spacing_for(100).unwrap(), 1);
    assert_eq!(config.tick_spacing_for(500).unwrap(), 10);
    assert_eq!(config.tick_spacing_for(3000).unwrap(), 60);
    assert_eq!(config.tick_spacing_for(10_000).unwrap(), 200);
    assert_error(config.tick_spacing_for(2500), ErrorCode::FeeTierNotEnabled);
}

#[test]
fn test_enable_fee_tier() {
    let owner = mock_pubkey(1);
    let mut config = AmmConfig::new(owner);

    config.enable_fee_tier(&owner, 2500, 50).unwrap();
    assert_eq!(config.tick_spacing_for(2500).unwrap(), 50);

    assert_error(
        config.enable_fee_tier(&mock_pubkey(2), 7000, 100),
        ErrorCode::UnauthorizedAccess,
    );
    assert_error(config.enable_fee_tier(&owner, 0, 10), ErrorCode::InvalidFeeRate);
    assert_error(
        config.enable_fee_tier(&owner, FEE_RATE_DENOMINATOR, 10),
        ErrorCode::InvalidFeeRate,
    );
    assert_error(config.enable_fee_tier(&owner, 7000, 0), ErrorCode::InvalidTickSpacing);
    assert_error(config.tick_spacing_for(7000), ErrorCode::FeeTierNotEnabled);
}

#[test]
fn test_protocol_fee_rate_bounds() {
    let owner = mock_pubkey(1);
    let mut config = AmmConfig::new(owner);

    config.set_protocol_fee_rate(&owner, 0).unwrap();
    config.set_protocol_fee_rate(&owner, FEE_RATE_DENOMINATOR).unwrap();
    assert_eq!(config.protocol_fee_rate, FEE_RATE_DENOMINATOR);
    assert_error(
        config.set_protocol_fee_rate(&owner, FEE_RATE_DENOMINATOR + 1),
        ErrorCode::InvalidProtocolFeeRate,
    );
}

#[test]
fn test_owner_handover() {
    let (owner, successor) = (mock_pubkey(1), mock_pubkey(2));
    let mut config = AmmConfig::new(owner);

    config.set_owner(&owner, successor).unwrap();
    assert_error(
        config.set_max_touched_ticks(&owner, Some(8)),
        ErrorCode::UnauthorizedAccess,
    );
    config.set_max_touched_ticks(&successor, Some(8)).unwrap();
    assert_eq!(config.max_touched_ticks, Some(8));
}
