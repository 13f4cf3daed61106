//! Booking status transitions.
//!
//! Every rider/driver operation on a booking is looked up in [`TRANSITIONS`]
//! by `(current status, operation, caller role)`. Anything not in the table is
//! rejected. Administrative overwrites do not go through here.

use std::fmt;

use thiserror::Error;

use crate::models::booking::BookingStatus;
use crate::models::user::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Confirm,
    DriverAccept,
    StartTrip,
    CompleteTrip,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Confirm => "confirm",
            Operation::DriverAccept => "confirm-driver",
            Operation::StartTrip => "start",
            Operation::CompleteTrip => "complete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideEffect {
    /// Bind the requested vehicle and price the trip from its rate.
    BindVehicle,
    SetVehicleAvailability(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: BookingStatus,
    pub operation: Operation,
    pub role: Role,
    pub to: BookingStatus,
    pub effect: Option<SideEffect>,
}

pub const TRANSITIONS: &[Transition] = &[
    Transition {
        from: BookingStatus::Requested,
        operation: Operation::Confirm,
        role: Role::Rider,
        to: BookingStatus::Confirmed,
        effect: Some(SideEffect::BindVehicle),
    },
    Transition {
        from: BookingStatus::Confirmed,
        operation: Operation::DriverAccept,
        role: Role::Driver,
        to: BookingStatus::DriverAssigned,
        effect: None,
    },
    Transition {
        from: BookingStatus::DriverAssigned,
        operation: Operation::StartTrip,
        role: Role::Driver,
        to: BookingStatus::TripStarted,
        effect: Some(SideEffect::SetVehicleAvailability(false)),
    },
    Transition {
        from: BookingStatus::TripStarted,
        operation: Operation::CompleteTrip,
        role: Role::Driver,
        to: BookingStatus::Completed,
        effect: Some(SideEffect::SetVehicleAvailability(true)),
    },
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("role {role} may not perform {operation}")]
    RoleNotPermitted { operation: Operation, role: Role },

    #[error("role {role} may not create bookings")]
    CreateNotPermitted { role: Role },

    #[error("cannot {operation} a booking in status {from}")]
    InvalidState {
        operation: Operation,
        from: BookingStatus,
    },
}

/// Checks that `role` appears in the table for `operation` at all.
pub fn authorize(operation: Operation, role: Role) -> Result<(), LifecycleError> {
    if TRANSITIONS
        .iter()
        .any(|t| t.operation == operation && t.role == role)
    {
        Ok(())
    } else {
        Err(LifecycleError::RoleNotPermitted { operation, role })
    }
}

pub fn next(
    from: BookingStatus,
    operation: Operation,
    role: Role,
) -> Result<&'static Transition, LifecycleError> {
    authorize(operation, role)?;

    TRANSITIONS
        .iter()
        .find(|t| t.from == from && t.operation == operation && t.role == role)
        .ok_or(LifecycleError::InvalidState { operation, from })
}

/// Status of a freshly created booking. Only riders create bookings.
pub fn initial_status(role: Role, has_vehicle: bool) -> Result<BookingStatus, LifecycleError> {
    if role != Role::Rider {
        return Err(LifecycleError::CreateNotPermitted { role });
    }

    Ok(if has_vehicle {
        BookingStatus::Confirmed
    } else {
        BookingStatus::Requested
    })
}

#[cfg(test)]
mod tests {
    use super::{authorize, initial_status, next, LifecycleError, Operation, SideEffect};
    use crate::models::booking::BookingStatus;
    use crate::models::user::Role;

    const ALL_STATUSES: [BookingStatus; 6] = [
        BookingStatus::Requested,
        BookingStatus::Confirmed,
        BookingStatus::DriverAssigned,
        BookingStatus::TripStarted,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
    ];

    #[test]
    fn happy_path_walks_the_chain_in_order() {
        let steps = [
            (Operation::Confirm, Role::Rider, BookingStatus::Confirmed),
            (Operation::DriverAccept, Role::Driver, BookingStatus::DriverAssigned),
            (Operation::StartTrip, Role::Driver, BookingStatus::TripStarted),
            (Operation::CompleteTrip, Role::Driver, BookingStatus::Completed),
        ];

        let mut status = BookingStatus::Requested;
        for (operation, role, expected) in steps {
            status = next(status, operation, role).unwrap().to;
            assert_eq!(status, expected);
        }
    }

    #[test]
    fn each_operation_has_exactly_one_source_status() {
        for (operation, role) in [
            (Operation::Confirm, Role::Rider),
            (Operation::DriverAccept, Role::Driver),
            (Operation::StartTrip, Role::Driver),
            (Operation::CompleteTrip, Role::Driver),
        ] {
            let allowed: Vec<_> = ALL_STATUSES
                .iter()
                .filter(|status| next(**status, operation, role).is_ok())
                .collect();
            assert_eq!(allowed.len(), 1, "{operation:?}");
        }
    }

    #[test]
    fn skipping_a_step_is_an_invalid_state() {
        let err = next(BookingStatus::Confirmed, Operation::StartTrip, Role::Driver).unwrap_err();
        assert_eq!(
            err,
            LifecycleError::InvalidState {
                operation: Operation::StartTrip,
                from: BookingStatus::Confirmed,
            }
        );
    }

    #[test]
    fn terminal_states_accept_nothing() {
        for status in [BookingStatus::Completed, BookingStatus::Cancelled] {
            assert!(status.is_terminal());
            assert!(next(status, Operation::Confirm, Role::Rider).is_err());
            assert!(next(status, Operation::CompleteTrip, Role::Driver).is_err());
        }
    }

    #[test]
    fn riders_cannot_drive_and_drivers_cannot_confirm() {
        assert!(matches!(
            authorize(Operation::StartTrip, Role::Rider),
            Err(LifecycleError::RoleNotPermitted { .. })
        ));
        assert!(matches!(
            next(BookingStatus::Requested, Operation::Confirm, Role::Driver),
            Err(LifecycleError::RoleNotPermitted { .. })
        ));
        assert!(authorize(Operation::DriverAccept, Role::Admin).is_err());
    }

    #[test]
    fn trip_start_and_completion_toggle_availability() {
        let start = next(BookingStatus::DriverAssigned, Operation::StartTrip, Role::Driver).unwrap();
        assert_eq!(start.effect, Some(SideEffect::SetVehicleAvailability(false)));

        let complete = next(BookingStatus::TripStarted, Operation::CompleteTrip, Role::Driver).unwrap();
        assert_eq!(complete.effect, Some(SideEffect::SetVehicleAvailability(true)));
    }

    #[test]
    fn initial_status_depends_on_preselected_vehicle() {
        assert_eq!(initial_status(Role::Rider, false), Ok(BookingStatus::Requested));
        assert_eq!(initial_status(Role::Rider, true), Ok(BookingStatus::Confirmed));
        assert_eq!(
            initial_status(Role::Driver, false),
            Err(LifecycleError::CreateNotPermitted { role: Role::Driver })
        );
    }
}
