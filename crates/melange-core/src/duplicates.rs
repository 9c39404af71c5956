use crate::proposal::Proposal;
use crate::types::ProposalStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Proposals of one student that organizations want to accept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalDuplicate {
    pub program: String,
    pub student: String,
    pub orgs: Vec<String>,
    /// Proposal ids.
    pub duplicates: Vec<String>,
    /// More than one proposal of the student is flagged, in any orgs.
    pub is_duplicate: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicatesStatus {
    pub program: String,
    #[serde(default)]
    pub calculated_on: Option<DateTime<Utc>>,
}

pub fn get_or_create_status_for_program<'a>(
    statuses: &'a mut Vec<DuplicatesStatus>,
    program: &str,
) -> &'a mut DuplicatesStatus {
    let pos = match statuses.iter().position(|s| s.program == program) {
        Some(pos) => pos,
        None => {
            statuses.push(DuplicatesStatus {
                program: program.to_string(),
                calculated_on: None,
            });
            statuses.len() - 1
        }
    };
    &mut statuses[pos]
}

/// One record per student with at least one pending or accepted proposal
/// marked `accept_as_project`, in order of the student's first proposal.
pub fn find_duplicates(program: &str, proposals: &[Proposal]) -> Vec<ProposalDuplicate> {
    let mut found: Vec<ProposalDuplicate> = Vec::new();
    for p in proposals.iter().filter(|p| {
        p.program == program
            && p.accept_as_project
            && matches!(p.status, ProposalStatus::Pending | ProposalStatus::Accepted)
    }) {
        let pos = match found.iter().position(|d| d.student == p.student) {
            Some(pos) => pos,
            None => {
                found.push(ProposalDuplicate {
                    program: program.to_string(),
                    student: p.student.clone(),
                    orgs: Vec::new(),
                    duplicates: Vec::new(),
                    is_duplicate: false,
                });
                found.len() - 1
            }
        };
        let dup = &mut found[pos];
        dup.duplicates.push(p.id.clone());
        if !dup.orgs.contains(&p.org) {
            dup.orgs.push(p.org.clone());
        }
        dup.is_duplicate = dup.duplicates.len() > 1;
    }
    found
}

/// Delete the program's records, or only its non-duplicates. Returns the
/// number deleted.
pub fn delete_all_for_program(
    records: &mut Vec<ProposalDuplicate>,
    program: &str,
    non_dupes_only: bool,
) -> usize {
    let before = records.len();
    records.retain(|d| d.program != program || (non_dupes_only && d.is_duplicate));
    before - records.len()
}

/// Recompute the program's records and stamp its status. Only duplicates
/// are kept once the run finishes.
pub fn recalculate(
    records: &mut Vec<ProposalDuplicate>,
    statuses: &mut Vec<DuplicatesStatus>,
    program: &str,
    proposals: &[Proposal],
    now: DateTime<Utc>,
) -> usize {
    delete_all_for_program(records, program, false);
    let found = find_duplicates(program, proposals);
    let dupes = found.iter().filter(|d| d.is_duplicate).count();
    records.extend(found);
    delete_all_for_program(records, program, true);
    get_or_create_status_for_program(statuses, program).calculated_on = Some(now);
    tracing::info!(program, duplicates = dupes, "duplicates recalculated");
    dupes
}
