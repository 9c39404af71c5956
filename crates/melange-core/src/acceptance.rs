//! Batch acceptance of GSoC proposals.
//!
//! The batch is a queue of small steps. The main step walks the program's
//! active organizations one at a time and re-queues itself with the next
//! cursor; each organization gets an accept step followed by a reject step.
//! Every step is safe to run again.

use crate::config::Config;
use crate::error::Result;
use crate::notification::Notification;
use crate::proposal::{self, Project};
use crate::store::Registry;
use crate::types::ProposalStatus;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum AcceptanceStep {
    Main { cursor: usize },
    Accept { org: String },
    Reject { org: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptanceReport {
    pub steps: usize,
    /// Proposal ids.
    pub accepted: Vec<String>,
    pub rejected: Vec<String>,
    /// Project ids created for the accepted proposals.
    pub projects: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct AcceptanceBatch {
    queue: VecDeque<AcceptanceStep>,
    report: AcceptanceReport,
}

impl Default for AcceptanceBatch {
    fn default() -> Self {
        Self::new()
    }
}

impl AcceptanceBatch {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::from([AcceptanceStep::Main { cursor: 0 }]),
            report: AcceptanceReport::default(),
        }
    }

    pub fn pending(&self) -> impl Iterator<Item = &AcceptanceStep> {
        self.queue.iter()
    }

    pub fn is_done(&self) -> bool {
        self.queue.is_empty()
    }

    /// Run the next queued step. Returns `false` once the queue is empty.
    pub fn step(&mut self, reg: &mut Registry, config: &Config) -> Result<bool> {
        let Some(step) = self.queue.pop_front() else {
            return Ok(false);
        };
        tracing::debug!(?step, "acceptance step");
        match step {
            AcceptanceStep::Main { cursor } => {
                let orgs: Vec<String> = reg.participating_orgs().iter().map(|o| o.key.clone()).collect();
                if let Some(org) = orgs.get(cursor) {
                    self.queue.push_back(AcceptanceStep::Accept { org: org.clone() });
                    self.queue.push_back(AcceptanceStep::Main { cursor: cursor + 1 });
                }
            }
            AcceptanceStep::Accept { org } => {
                self.accept(reg, config, &org)?;
                self.queue.push_back(AcceptanceStep::Reject { org });
            }
            AcceptanceStep::Reject { org } => self.reject(reg, config, &org)?,
        }
        self.report.steps += 1;
        Ok(true)
    }

    /// Drain the queue and return what was done.
    pub fn run(mut self, reg: &mut Registry, config: &Config) -> Result<AcceptanceReport> {
        while self.step(reg, config)? {}
        tracing::info!(
            accepted = self.report.accepted.len(),
            rejected = self.report.rejected.len(),
            "proposal acceptance finished"
        );
        Ok(self.report)
    }

    fn accept(&mut self, reg: &mut Registry, config: &Config, org_key: &str) -> Result<()> {
        let org = reg.org(org_key)?.clone();
        let chosen: Vec<String> = proposal::proposals_to_be_accepted_for_org(&org, &reg.proposals)
            .iter()
            .map(|p| p.id.clone())
            .collect();

        for id in chosen {
            let Some(pos) = reg.proposals.iter().position(|p| p.id == id) else {
                continue;
            };
            let student = reg.proposals[pos].student.clone();
            reg.proposals[pos].status = ProposalStatus::Accepted;
            let project_id = reg.next_project_id();
            let project = Project::from_proposal(project_id.clone(), &reg.proposals[pos]);
            reg.projects.push(project);

            let email = reg.profile(&student)?.email.clone();
            reg.outbox.push(Notification::to(
                email,
                config.mail.accepted_subject.clone(),
                format!(
                    "Your proposal \"{}\" to {} has been accepted.",
                    reg.proposals[pos].title, org.name
                ),
            ));
            tracing::info!(proposal = %id, org = org_key, project = %project_id, "proposal accepted");
            self.report.accepted.push(id);
            self.report.projects.push(project_id);
        }
        Ok(())
    }

    fn reject(&mut self, reg: &mut Registry, config: &Config, org_key: &str) -> Result<()> {
        let mut students: Vec<String> = Vec::new();
        for p in reg
            .proposals
            .iter_mut()
            .filter(|p| p.org == org_key && p.status == ProposalStatus::Pending)
        {
            p.status = ProposalStatus::Rejected;
            self.report.rejected.push(p.id.clone());
            if !students.contains(&p.student) {
                students.push(p.student.clone());
            }
        }

        let subject = config.mail.rejected_subject_for(&reg.program.name);
        for student in students {
            let email = reg.profile(&student)?.email.clone();
            reg.outbox.push(Notification::to(
                email,
                subject.clone(),
                "We regret to inform you that your proposal was not accepted.",
            ));
        }
        Ok(())
    }
}
