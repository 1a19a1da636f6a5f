use super::IPledgeRepo;
use crate::repos::shared::inmemory_repo::*;
use chrono::{DateTime, Utc};
use pledger_domain::{RecurringPledge, ID};

pub struct InMemoryPledgeRepo {
    pledges: std::sync::Mutex<Vec<RecurringPledge>>,
}

impl InMemoryPledgeRepo {
    pub fn new() -> Self {
        Self {
            pledges: std::sync::Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl IPledgeRepo for InMemoryPledgeRepo {
    async fn insert(&self, pledge: &RecurringPledge) -> anyhow::Result<()> {
        insert(pledge, &self.pledges);
        Ok(())
    }

    async fn save(&self, pledge: &RecurringPledge) -> anyhow::Result<()> {
        save(pledge, &self.pledges);
        Ok(())
    }

    async fn find(&self, pledge_id: &ID) -> Option<RecurringPledge> {
        find(pledge_id, &self.pledges)
    }

    async fn find_due(
        &self,
        before: DateTime<Utc>,
        limit: usize,
    ) -> anyhow::Result<Vec<RecurringPledge>> {
        let mut due = find_by(&self.pledges, |pledge| pledge.is_due(before));
        due.sort_by_key(|pledge| pledge.next_charge_at);
        due.truncate(limit);
        Ok(due)
    }
}
