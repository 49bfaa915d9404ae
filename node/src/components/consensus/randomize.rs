//! Epoch-checkpoint validator randomization.
//!
//! At each checkpoint the ordered "M2" validator list is derived from
//! the candidates' on-chain committed secrets: the secrets fold into
//! a PRNG seed, and the seed drives a deterministic permutation of
//! the candidate set. The producer writes the packed list into the
//! checkpoint header; every importing node re-derives it and rejects
//! the block on any mismatch.

use hex_fmt::HexFmt;
use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

use meridian_types::{pack_address_list, Address, Digest};

use crate::types::{BlockHash, Header};

use super::{Error, Masternode, Posv};

impl Posv {
    /// Builds the checkpoint's packed validator list from the
    /// candidates' committed secrets, read from governance state at
    /// the checkpoint's parent.
    ///
    /// Any unavailable secret aborts the construction; the checkpoint
    /// cannot be sealed without the full list.
    pub fn build_validators(
        &self,
        parent_hash: &BlockHash,
        candidates: &[Address],
    ) -> Result<Vec<u8>, Error> {
        if candidates.is_empty() {
            return Err(Error::NoCandidates);
        }
        let mut secrets = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            secrets.push(self.governance.randomize_secret(parent_hash, *candidate)?);
        }
        let mut ordered = candidates.to_vec();
        ordered.shuffle(&mut ChaCha8Rng::seed_from_u64(combine_secrets(&secrets)));
        debug!(candidates = ordered.len(), "derived checkpoint validator order");
        Ok(pack_address_list(&ordered))
    }

    /// Verifies a checkpoint header's embedded validator list against
    /// the independently derived one. A mismatch is a hard validity
    /// failure; the block must be rejected from the canonical chain.
    pub fn verify_validator_set(
        &self,
        header: &Header,
        candidates: &[Address],
    ) -> Result<(), Error> {
        let number = header.number();
        if number == 0 || !self.config.is_checkpoint(number) {
            return Ok(());
        }
        let expected = self.build_validators(header.parent_hash(), candidates)?;
        if header.validators() != expected.as_slice() {
            warn!(
                block = number,
                embedded = %HexFmt(header.validators()),
                derived = %HexFmt(&expected),
                "checkpoint validator list mismatch"
            );
            return Err(Error::InvalidCheckpointValidators);
        }
        Ok(())
    }

    /// Recomputes the candidate list straight from governance
    /// contract state at the given block: all candidates with their
    /// stakes, the zero address filtered out, sorted by stake
    /// descending (ties keep contract order) and truncated to the
    /// masternode cap.
    ///
    /// This is an authoritative cross-check independent of the cached
    /// snapshot path; the two are populated by different triggers and
    /// can diverge after a chain reorganization.
    pub fn contract_derived_signers(&self, at: &BlockHash) -> Result<Vec<Address>, Error> {
        let mut masternodes = Vec::new();
        for address in self.governance.candidates(at)? {
            if address.is_zero() {
                continue;
            }
            let stake = self.governance.candidate_stake(at, address)?;
            masternodes.push(Masternode { address, stake });
        }
        masternodes.sort_by(|left, right| right.stake.cmp(&left.stake));
        masternodes.truncate(self.config.max_masternodes);
        Ok(masternodes
            .into_iter()
            .map(|masternode| masternode.address)
            .collect())
    }
}

/// Folds the candidates' committed secrets into one PRNG seed.
fn combine_secrets(secrets: &[u64]) -> u64 {
    let mut packed = Vec::with_capacity(secrets.len() * 8);
    for secret in secrets {
        packed.extend_from_slice(&secret.to_le_bytes());
    }
    let digest = Digest::hash(&packed);
    u64::from_le_bytes(
        digest.value()[..8]
            .try_into()
            .expect("digest is longer than a seed"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_depends_on_every_secret() {
        let base = combine_secrets(&[1, 2, 3]);
        assert_eq!(base, combine_secrets(&[1, 2, 3]));
        assert_ne!(base, combine_secrets(&[1, 2, 4]));
        assert_ne!(base, combine_secrets(&[3, 2, 1]));
    }

    #[test]
    fn shuffle_with_equal_seed_is_deterministic() {
        let addresses: Vec<Address> = (1u8..=20)
            .map(|tag| Address::new([tag; Address::LENGTH]))
            .collect();
        let mut first = addresses.clone();
        let mut second = addresses.clone();
        first.shuffle(&mut ChaCha8Rng::seed_from_u64(combine_secrets(&[7, 7])));
        second.shuffle(&mut ChaCha8Rng::seed_from_u64(combine_secrets(&[7, 7])));
        assert_eq!(first, second);

        let mut sorted = first.clone();
        sorted.sort();
        assert_eq!(sorted, addresses, "shuffle must be a permutation");
    }
}
