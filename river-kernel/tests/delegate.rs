use river_kernel::codec::{make_event_with_clock, make_signer_delegate, unpack_envelope, SignerContext, UnpackOpts};
use river_kernel::RiverError;
use river_model::crypto::generate_signing_key;
use river_model::ManualClock;
use river_proto::{stream_event, ErrCode, MemberPayload, MembershipOp};

const NOW: i64 = 1_760_000_000_000;

fn join(ctx: &SignerContext) -> Option<stream_event::Payload> {
    let addr = ctx.creator_address.to_vec();
    Some(MemberPayload::membership(MembershipOp::SoJoin, addr.clone(), addr).into())
}

#[test]
fn test_expired_delegate_is_rejected() {
    let root = generate_signing_key();
    let device = make_signer_delegate(&root, NOW - 1_000).unwrap();
    let env = make_event_with_clock(&device, join(&device), None, &ManualClock::at(NOW - 5_000)).unwrap();

    let err = unpack_envelope(&env, &UnpackOpts::at(NOW)).unwrap_err();
    assert_eq!(err.code, ErrCode::BadDelegateSig);
    assert!(RiverError::contains(&err, ErrCode::BadDelegateSig));
    assert!(err.to_string().contains("event delegate has expired"));
}

#[test]
fn test_live_delegate_is_attributed_to_root() {
    let root = generate_signing_key();
    let root_user_id = SignerContext::root(root.clone()).unwrap().creator_user_id();
    let device = make_signer_delegate(&root, NOW + 60_000).unwrap();
    let env = make_event_with_clock(&device, join(&device), None, &ManualClock::at(NOW)).unwrap();

    let parsed = unpack_envelope(&env, &UnpackOpts::at(NOW)).unwrap();
    assert_eq!(parsed.creator_user_id, root_user_id);

    let device_user_id = SignerContext::root(device.signer_private_key.clone()).unwrap().creator_user_id();
    assert_ne!(parsed.creator_user_id, device_user_id);
}

#[test]
fn test_delegate_without_expiry_never_expires() {
    let root = generate_signing_key();
    let device = make_signer_delegate(&root, 0).unwrap();
    let env = make_event_with_clock(&device, join(&device), None, &ManualClock::at(NOW)).unwrap();
    assert!(unpack_envelope(&env, &UnpackOpts::at(i64::MAX)).is_ok());
}

#[test]
fn test_delegate_from_other_root_fails() {
    let root = generate_signing_key();
    let other = make_signer_delegate(&generate_signing_key(), NOW + 60_000).unwrap();
    let mut device = make_signer_delegate(&root, NOW + 60_000).unwrap();
    device.delegate_sig = other.delegate_sig.clone();

    let env = make_event_with_clock(&device, join(&device), None, &ManualClock::at(NOW)).unwrap();
    let err = unpack_envelope(&env, &UnpackOpts::at(NOW)).unwrap_err();
    assert_eq!(err.code, ErrCode::BadDelegateSig);
}
