//! Penalty evaluation and masternode rehabilitation.
//!
//! At every epoch checkpoint the previous epoch's block history is
//! scanned once and masternodes that under-performed are excluded
//! from the next active set. Two policies coexist, gated by the
//! protocol upgrade schedule: the legacy confirmation scan, and the
//! signing-lookback tally that also opens a "comeback" path for
//! masternodes penalized several epochs ago that have resumed
//! signing.

use std::{
    collections::{BTreeMap, BTreeSet, HashSet},
    time::Instant,
};

use itertools::Itertools;
use tracing::debug;

use meridian_types::Address;

use crate::{
    types::{BlockHash, Header},
    utils::DisplayIter,
};

use super::{traits::ChainReader, Error, Posv};

/// Per-producer block tally over one trailing window of the chain.
///
/// Shared by the penalty evaluator and the reward distributor, both
/// of which weigh masternodes by production share.
pub(super) struct EpochTally {
    /// Blocks produced per address within the window.
    pub(super) produced: BTreeMap<Address, u64>,
    /// Hashes of the walked blocks; entry `i` is the block at height
    /// `window_end - 1 - i`.
    pub(super) block_hashes: Vec<BlockHash>,
}

impl Posv {
    /// Walks the `window - 1` ancestors of `header`, recovering each
    /// block's producer and tallying per-producer block counts. Stops
    /// early at the genesis block, which has no producer.
    pub(super) fn tally_producers(
        &self,
        chain: &dyn ChainReader,
        header: &Header,
        window: u64,
    ) -> Result<EpochTally, Error> {
        let mut produced = BTreeMap::new();
        let mut block_hashes = Vec::with_capacity(window as usize);
        let mut current_hash = *header.parent_hash();
        let mut current_number = header.number().saturating_sub(1);
        for _ in 1..window {
            if current_number == 0 {
                break;
            }
            block_hashes.push(current_hash);
            let walked =
                chain
                    .header(&current_hash, current_number)
                    .ok_or(Error::MissingAncestor {
                        number: current_number,
                        hash: current_hash,
                    })?;
            let producer = self.seal.recover_producer(&walked)?;
            *produced.entry(producer).or_insert(0) += 1;
            current_hash = *walked.parent_hash();
            current_number -= 1;
        }
        Ok(EpochTally {
            produced,
            block_hashes,
        })
    }

    /// Computes the penalty list for the checkpoint `header`.
    ///
    /// `candidates` is the current masternode candidate list, used to
    /// restrict comeback eligibility. Any failure reading an ancestor
    /// header or cached signer data aborts the computation; the
    /// checkpoint's `penalties` field cannot be derived without it.
    pub fn penalties(
        &self,
        chain: &dyn ChainReader,
        header: &Header,
        candidates: &[Address],
    ) -> Result<Vec<Address>, Error> {
        let number = header.number();
        if number < self.config.epoch_length {
            return Ok(Vec::new());
        }
        let start = Instant::now();
        let penalties = if self.config.lookback_penalty_active(number) {
            self.penalties_lookback(chain, header, candidates)?
        } else {
            self.penalties_legacy(chain, number)?
        };
        self.metrics.current_checkpoint.set(number as i64);
        self.metrics
            .penalized_masternodes
            .set(penalties.len() as i64);
        self.metrics
            .penalty_computation_time
            .set(start.elapsed().as_secs_f64());
        debug!(
            block = number,
            elapsed = ?start.elapsed(),
            penalized = %DisplayIter::new(penalties.iter()),
            "penalty evaluation finished"
        );
        Ok(penalties)
    }

    /// Legacy policy: a masternode of the previous epoch that never
    /// confirmed any of the epoch's blocks is excluded. Stops
    /// scanning as soon as every masternode has been seen confirming.
    fn penalties_legacy(
        &self,
        chain: &dyn ChainReader,
        checkpoint: u64,
    ) -> Result<Vec<Address>, Error> {
        let previous_checkpoint = checkpoint - self.config.epoch_length;
        let previous_header = chain
            .header_by_number(previous_checkpoint)
            .ok_or(Error::MissingHeader(previous_checkpoint))?;
        let mut flagged: BTreeSet<Address> = self
            .snapshot(chain, &previous_header)?
            .signer_list()
            .into_iter()
            .collect();

        let state_at = chain.current_header().hash();
        for number in previous_checkpoint..checkpoint {
            if flagged.is_empty() {
                break;
            }
            if number % self.config.merge_sign_range != 0 && self.config.relaxed_signing_active(number)
            {
                continue;
            }
            let confirmed = chain
                .header_by_number(number)
                .ok_or(Error::MissingHeader(number))?
                .hash();
            let confirmers: HashSet<Address> = self
                .governance
                .block_confirmers(&state_at, &confirmed)?
                .into_iter()
                .collect();
            if !confirmers.is_empty() {
                flagged = flagged
                    .into_iter()
                    .filter(|address| !confirmers.contains(address))
                    .collect();
            }
        }
        Ok(flagged.into_iter().collect())
    }

    /// Signing-lookback policy: tally the previous epoch's producers
    /// and penalize under-producers, plus prior masternodes that
    /// produced nothing; rehabilitate comeback candidates that have
    /// resumed signing inside the trailing window.
    fn penalties_lookback(
        &self,
        chain: &dyn ChainReader,
        header: &Header,
        candidates: &[Address],
    ) -> Result<Vec<Address>, Error> {
        let number = header.number();
        let epoch_length = self.config.epoch_length;
        let tally = self.tally_producers(chain, header, epoch_length)?;

        let mut penalties: Vec<Address> = Vec::new();
        for (producer, total) in &tally.produced {
            if *total < self.config.min_blocks_per_epoch {
                debug!(address = %producer, total, "masternode produced too few blocks");
                penalties.push(*producer);
            }
        }

        let previous_checkpoint = number - epoch_length;
        let previous_header = chain
            .header_by_number(previous_checkpoint)
            .ok_or(Error::MissingHeader(previous_checkpoint))?;
        for address in self.snapshot(chain, &previous_header)?.signer_list() {
            if !tally.produced.contains_key(&address) {
                debug!(%address, "masternode produced no blocks at all");
                penalties.push(address);
            }
        }

        let comebacks = self.comeback_candidates(chain, number, candidates)?;
        let unrehabilitated = self.unrehabilitated(chain, header, &tally, comebacks)?;

        if self.config.full_penalty_active(number) {
            Ok(penalties
                .into_iter()
                .chain(unrehabilitated)
                .unique()
                .collect())
        } else {
            Ok(unrehabilitated)
        }
    }

    /// Masternodes penalized `limit_penalty_epoch` epochs ago that
    /// are candidates again and therefore eligible for comeback.
    fn comeback_candidates(
        &self,
        chain: &dyn ChainReader,
        checkpoint: u64,
        candidates: &[Address],
    ) -> Result<Vec<Address>, Error> {
        let comeback_length = (self.config.limit_penalty_epoch + 1) * self.config.epoch_length;
        if checkpoint <= comeback_length {
            return Ok(Vec::new());
        }
        let comeback_checkpoint = checkpoint - comeback_length;
        let comeback_header = chain
            .header_by_number(comeback_checkpoint)
            .ok_or(Error::MissingHeader(comeback_checkpoint))?;
        let candidate_set: HashSet<Address> = candidates.iter().copied().collect();
        Ok(comeback_header
            .penalty_addresses()
            .into_iter()
            .filter(|address| candidate_set.contains(address))
            .collect())
    }

    /// Scans the trailing `range_return_signer` blocks for confirming
    /// transactions from comeback candidates and returns those still
    /// unrehabilitated. Removal is immediate on the first confirmed
    /// signature found in-window.
    fn unrehabilitated(
        &self,
        chain: &dyn ChainReader,
        header: &Header,
        tally: &EpochTally,
        comebacks: Vec<Address>,
    ) -> Result<Vec<Address>, Error> {
        if comebacks.is_empty() {
            return Ok(comebacks);
        }
        let mut remaining: BTreeSet<Address> = comebacks.into_iter().collect();
        let mut aligned: HashSet<BlockHash> = HashSet::new();
        let mut walked: HashSet<BlockHash> = HashSet::new();
        let window = self
            .config
            .range_return_signer
            .min(tally.block_hashes.len() as u64);

        // Oldest window block first, so a confirming transaction is
        // matched against blocks that precede it.
        for offset in (0..window).rev() {
            if remaining.is_empty() {
                break;
            }
            let block_number = header.number() - 1 - offset;
            let block_hash = tally.block_hashes[offset as usize];
            walked.insert(block_hash);
            if block_number % self.config.merge_sign_range == 0 {
                aligned.insert(block_hash);
            }

            let confirmations = self.signers_of(chain, &block_hash, block_number)?;
            let mut rehabilitated: HashSet<Address> = HashSet::new();
            for transaction in confirmations.iter() {
                if let Some(confirmed) = transaction.confirmed_block_hash() {
                    let counts = aligned.contains(&confirmed)
                        || (self.config.count_unaligned_confirmations && walked.contains(&confirmed));
                    if counts {
                        rehabilitated.insert(transaction.sender());
                    }
                }
            }
            if !rehabilitated.is_empty() {
                remaining = remaining
                    .into_iter()
                    .filter(|address| !rehabilitated.contains(address))
                    .collect();
            }
        }
        Ok(remaining.into_iter().collect())
    }
}
