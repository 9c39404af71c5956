use crate::error::{MelangeError, Result};
use crate::organization::Organization;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotTransferStatus {
    Pending,
    Accepted,
    Rejected,
}

impl fmt::Display for SlotTransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SlotTransferStatus::Pending => "pending",
            SlotTransferStatus::Accepted => "accepted",
            SlotTransferStatus::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

/// Slots an organization hands back to the program for redistribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotTransfer {
    pub org: String,
    pub program: String,
    pub nr_slots: u32,
    #[serde(default)]
    pub remarks: String,
    pub status: SlotTransferStatus,
}

impl SlotTransfer {
    pub fn new(org: &Organization, nr_slots: u32, remarks: impl Into<String>) -> Self {
        Self {
            org: org.key.clone(),
            program: org.program.clone(),
            nr_slots,
            remarks: remarks.into(),
            status: SlotTransferStatus::Pending,
        }
    }
}

/// Transfers filed by `org`, oldest first.
pub fn slot_transfers_for_org<'a>(transfers: &'a [SlotTransfer], org: &str) -> Vec<&'a SlotTransfer> {
    transfers.iter().filter(|t| t.org == org).collect()
}

pub fn accepted_slots_transferred(transfers: &[SlotTransfer], org: &str) -> u32 {
    transfers
        .iter()
        .filter(|t| t.org == org && t.status == SlotTransferStatus::Accepted)
        .map(|t| t.nr_slots)
        .sum()
}

/// Settle a pending transfer. Accepting removes the slots from the org.
pub fn resolve_transfer(transfer: &mut SlotTransfer, org: &mut Organization, accept: bool) -> Result<()> {
    if transfer.status != SlotTransferStatus::Pending {
        return Err(MelangeError::InvalidTransition {
            from: transfer.status.to_string(),
            action: if accept { "accept" } else { "reject" }.to_string(),
            reason: "slot transfer already resolved".to_string(),
        });
    }
    if accept {
        if transfer.nr_slots > org.slots {
            return Err(MelangeError::InvalidTransition {
                from: transfer.status.to_string(),
                action: "accept".to_string(),
                reason: format!("{} has only {} slots", org.key, org.slots),
            });
        }
        org.slots -= transfer.nr_slots;
        transfer.status = SlotTransferStatus::Accepted;
    } else {
        transfer.status = SlotTransferStatus::Rejected;
    }
    tracing::info!(org = %org.key, slots = transfer.nr_slots, status = %transfer.status, "slot transfer resolved");
    Ok(())
}
