use super::*;
use crate::helpers::*;

#[test]
fn can_calculate_deltas_and_magnitude() {
    let event = PreferenceUpdateEvent::new(
        10.,
        create_weights("rider1", (0.5, -0.3, 0.8, -0.2)),
        create_weights("rider1", (0.6, -0.4, 0.8, -0.15)),
        UpdateReason::RequestAccepted,
        0.9,
    );

    let deltas = event.deltas();

    assert_eq!(event.rider_id().as_str(), "rider1");
    assert_close!(deltas.access, 0.1);
    assert_close!(deltas.wait, -0.1);
    assert_close!(deltas.ivt, 0.);
    assert_close!(deltas.egress, 0.05);
    assert_close!(event.magnitude(), 0.25);
}

#[test]
fn can_map_event_kind_to_reason() {
    let cases = vec![
        (EventKind::Acceptance, UpdateReason::RequestAccepted, "request_accepted"),
        (EventKind::Rejection, UpdateReason::RequestRejected, "request_rejected"),
        (EventKind::Completion, UpdateReason::TripCompleted, "trip_completed"),
    ];

    for (kind, reason, name) in cases {
        assert_eq!(UpdateReason::from(kind), reason);
        assert_eq!(reason.to_string(), name);
        assert_eq!(serde_json::to_string(&reason).unwrap(), format!("\"{name}\""));
    }
}
