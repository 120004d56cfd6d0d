//! Dataset access port trait.

use crate::domain::error::RedblueError;
use crate::domain::record::{ElectionRecord, FinancialRecord};
use std::io;
use std::thread;

pub trait DatasetPort {
    fn load_election(&self) -> Result<Vec<ElectionRecord>, RedblueError>;

    fn load_financial(&self) -> Result<Vec<FinancialRecord>, RedblueError>;

    /// Load both datasets, the election results on a scoped thread. Returns
    /// only once both are fully in memory.
    fn load_both(&self) -> Result<(Vec<ElectionRecord>, Vec<FinancialRecord>), RedblueError>
    where
        Self: Sync,
    {
        thread::scope(|s| {
            let election = s.spawn(|| self.load_election());
            let financial = self.load_financial();
            let election = election
                .join()
                .map_err(|_| RedblueError::Io(io::Error::other("election loader panicked")))?;
            Ok((election?, financial?))
        })
    }
}
