use chrono::Utc;
use uuid::Uuid;

use crate::error::{RamError, RamResult};
use crate::model::{Defect, DefectLink, NewDefect};
use crate::service::execution::load_mutable;
use crate::storage::{self, Pool};

#[derive(Clone)]
pub struct DefectService {
    pool: Pool,
}

impl DefectService {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    pub fn create(&self, new: NewDefect) -> RamResult<Defect> {
        if new.name.trim().is_empty() {
            return Err(RamError::InvalidRequest("defect name must not be empty".to_string()));
        }
        let defect = Defect {
            id: Uuid::new_v4(),
            name: new.name,
            link: new.link,
            description: new.description,
            created_at: Utc::now(),
            execution_request_ids: Vec::new(),
            test_run_ids: Vec::new(),
        };
        let conn = self.pool.get()?;
        storage::defects::insert(&conn, &defect)?;
        tracing::info!(id = %defect.id, name = %defect.name, "defect created");
        Ok(defect)
    }

    pub fn get(&self, id: Uuid) -> RamResult<Defect> {
        let conn = self.pool.get()?;
        storage::defects::get(&conn, id)?.ok_or(RamError::DefectNotFound(id))
    }

    /// Link a defect to an execution request or test run. The target must
    /// exist and its execution request must not be archived.
    pub fn link(&self, id: Uuid, link: DefectLink) -> RamResult<Defect> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;
        if storage::defects::get(&tx, id)?.is_none() {
            return Err(RamError::DefectNotFound(id));
        }

        let execution_request_id = match link {
            DefectLink::ExecutionRequest(er_id) => er_id,
            DefectLink::TestRun(run_id) => {
                storage::test_runs::get(&tx, run_id)?
                    .ok_or(RamError::TestRunNotFound(run_id))?
                    .execution_request_id
            }
        };
        load_mutable(&tx, execution_request_id)?;

        storage::defects::add_link(&tx, id, link)?;
        let defect = storage::defects::get(&tx, id)?.ok_or(RamError::DefectNotFound(id))?;
        tx.commit()?;
        Ok(defect)
    }

    pub fn list(&self, execution_request_id: Option<Uuid>) -> RamResult<Vec<Defect>> {
        let conn = self.pool.get()?;
        Ok(storage::defects::list(&conn, execution_request_id)?)
    }
}
