use tracing::{debug, info, warn};

use shared_models::booking::AppointmentStatus;

use crate::models::AppointmentError;

/// Transition table of the appointment lifecycle.
#[derive(Debug, Default, Clone, Copy)]
pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Validate that a status transition is allowed
    pub fn validate_status_transition(
        &self,
        current_status: &AppointmentStatus,
        new_status: &AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition from {} to {}", current_status, new_status);

        if !self.get_valid_transitions(current_status).contains(new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(AppointmentError::InvalidStatusTransition {
                from: *current_status,
                to: *new_status,
            });
        }

        info!("Status transition validated: {} -> {}", current_status, new_status);
        Ok(())
    }

    /// Get all valid next statuses for a given current status
    pub fn get_valid_transitions(&self, current_status: &AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Booked => vec![
                AppointmentStatus::Confirmed,
                AppointmentStatus::Cancelled,
                AppointmentStatus::NoShow,
            ],
            AppointmentStatus::Confirmed => vec![
                AppointmentStatus::InProgress,
                AppointmentStatus::Cancelled,
                AppointmentStatus::NoShow,
            ],
            AppointmentStatus::InProgress => vec![
                AppointmentStatus::Completed,
                AppointmentStatus::Cancelled,
            ],
            // Terminal states
            AppointmentStatus::Completed => vec![],
            AppointmentStatus::Cancelled => vec![],
            AppointmentStatus::NoShow => vec![],
        }
    }
}
