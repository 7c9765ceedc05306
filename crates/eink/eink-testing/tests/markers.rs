#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! Update markers and the wait ioctls

use eink_fb::{ErrorKind, FbError, RefreshRequest, SessionState, WaitKind};
use eink_testing::{SimConfig, SimOp, TestHarness};
use nix::errno::Errno;

fn clara() -> TestHarness {
    TestHarness::kobo(376, SimConfig::clara_hd()).unwrap()
}

#[test]
fn test_zero_waits_on_the_last_marker() {
    let mut t = clara();
    let marker = t.refresh(&RefreshRequest::full_screen()).unwrap();
    assert_ne!(marker, 0);
    assert_eq!(t.last_marker(), Some(marker));

    t.wait_for_completion(marker).unwrap();
    t.wait_for_completion(0).unwrap();

    let waits = t.sim().waits();
    assert_eq!(waits.len(), 2);
    assert_eq!(waits[0], waits[1]);
    assert_eq!(waits[0].marker, marker);
    assert_eq!(waits[0].kind, WaitKind::CompleteMarkerData);
}

#[test]
fn test_markers_increase() {
    let mut t = clara();
    let first = t.refresh(&RefreshRequest::full_screen()).unwrap();
    let second = t.refresh(&RefreshRequest::full_screen()).unwrap();
    assert_eq!(second, first.wrapping_add(1).max(1));

    let sent: Vec<_> = t.sim().updates().iter().filter_map(|u| u.payload.marker()).collect();
    assert_eq!(sent, [first, second]);
}

#[test]
fn test_wait_before_any_refresh() {
    let mut t = clara();
    let err = t.wait_for_completion(0).unwrap_err();
    assert!(matches!(err, FbError::NoMarker));
    assert_eq!(err.kind(), ErrorKind::State);
    assert!(t.sim().waits().is_empty());
}

#[test]
fn test_rejected_refresh_keeps_the_marker() {
    let mut t = clara();
    t.sim_mut().fail_next(SimOp::SendUpdate, Errno::EIO);

    let err = t.refresh(&RefreshRequest::full_screen()).unwrap_err();
    assert_eq!(err.errno(), Errno::EIO);
    assert_eq!(err.kind(), ErrorKind::Hardware);
    assert!(t.last_marker().is_none());
    assert_eq!(t.state(), SessionState::Uninitialized);

    // The retry goes out with the marker the failed request carried
    let marker = t.refresh(&RefreshRequest::full_screen()).unwrap();
    assert_eq!(t.sim().updates().len(), 1);
    assert_eq!(t.last_update().unwrap().payload.marker(), Some(marker));
    assert_eq!(t.state(), SessionState::Ready);
}

#[test]
fn test_completion_time_from_remaining_jiffies() {
    // 100 jiffies left at USER_HZ=100: one second short of the 5s timeout
    let sim = SimConfig::clara_hd().wait_remaining_jiffies(100);
    let mut t = TestHarness::kobo(376, sim).unwrap();
    let marker = t.refresh(&RefreshRequest::full_screen()).unwrap();
    assert_eq!(t.wait_for_completion(marker).unwrap(), 4000);
}

#[test]
fn test_unknown_marker_returns() {
    let mut t = clara();
    let marker = t.refresh(&RefreshRequest::full_screen()).unwrap();
    let stale = marker.wrapping_add(1000).max(1);
    assert!(t.wait_for_completion(stale).is_ok());
    assert_eq!(t.sim().waits().last().unwrap().marker, stale);
}

#[test]
fn test_submission_wait() {
    // PaperWhite 4
    let mut t = TestHarness::kindle(0x2F7, SimConfig::paperwhite4()).unwrap();
    let marker = t.refresh(&RefreshRequest::full_screen()).unwrap();
    t.wait_for_submission(marker).unwrap();
    t.wait_for_completion(marker).unwrap();

    let kinds: Vec<_> = t.sim().waits().iter().map(|w| w.kind).collect();
    assert_eq!(kinds, [WaitKind::Submission, WaitKind::CompleteMarkerData]);
}

#[test]
fn test_mtk_refresh_and_waits() {
    // PaperWhite 5
    let mut t = TestHarness::kindle(0x690, SimConfig::new(1236, 1648, 8)).unwrap();
    assert!(t.can_wait_for_completion());
    let marker = t.refresh(&RefreshRequest::full_screen().flashing(true)).unwrap();
    assert!(matches!(t.last_update().unwrap().payload, eink_fb::UpdatePayload::Mtk(_)));
    t.wait_for_submission(marker).unwrap();
    t.wait_for_completion(marker).unwrap();

    let kinds: Vec<_> = t.sim().waits().iter().map(|w| w.kind).collect();
    assert_eq!(kinds, [WaitKind::Submission, WaitKind::CompleteMarkerData]);
}

#[test]
fn test_waits_the_driver_lacks() {
    let mut t = clara();
    let marker = t.refresh(&RefreshRequest::full_screen()).unwrap();
    let err = t.wait_for_submission(marker).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unsupported);

    let mut k4 = TestHarness::kindle(0x0E, SimConfig::kindle4()).unwrap();
    assert!(!k4.can_wait_for_completion());
    k4.refresh(&RefreshRequest::full_screen()).unwrap();
    assert_eq!(k4.wait_for_completion(0).unwrap_err().kind(), ErrorKind::Unsupported);
    assert!(k4.sim().waits().is_empty());
}

#[test]
fn test_ntx_completion_wait_kind() {
    // Aura H2O: Mk. 5, NTX ioctls
    let mut t = TestHarness::kobo(370, SimConfig::new(1080, 1440, 8)).unwrap();
    assert_eq!(t.completion_wait_kind(), Some(WaitKind::CompleteU32));
    t.refresh(&RefreshRequest::full_screen()).unwrap();
    t.wait_for_completion(0).unwrap();
    assert_eq!(t.sim().waits()[0].kind, WaitKind::CompleteU32);
}

#[test]
fn test_unreliable_wait_timeout_is_ignored() {
    // Nia
    let mut t = TestHarness::kobo(382, SimConfig::new(758, 1024, 8)).unwrap();
    assert!(t.quirks().unreliable_wait_for);
    let marker = t.refresh(&RefreshRequest::full_screen()).unwrap();

    t.sim_mut().fail_next(SimOp::Wait, Errno::ETIMEDOUT);
    assert_eq!(t.wait_for_completion(marker).unwrap(), 5000);

    // Other failures still count
    t.sim_mut().fail_next(SimOp::Wait, Errno::EIO);
    assert_eq!(t.wait_for_completion(marker).unwrap_err().errno(), Errno::EIO);
}

#[test]
fn test_reliable_wait_timeout_is_reported() {
    let mut t = clara();
    let marker = t.refresh(&RefreshRequest::full_screen()).unwrap();
    t.sim_mut().fail_next(SimOp::Wait, Errno::ETIMEDOUT);

    let err = t.wait_for_completion(marker).unwrap_err();
    assert_eq!(err.errno(), Errno::ETIMEDOUT);
    assert!(err.to_string().contains("MXCFB_WAIT_FOR_UPDATE_COMPLETE"));
}
