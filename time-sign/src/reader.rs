// Copyright (c) 2022, Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::error::{TimeSignError, TimeSignResult};
use std::io::{ErrorKind, Read};
use tracing::debug;

/// Splits a byte stream into consecutive blocks of a fixed size.
///
/// The reader is an iterator that ends in one of three ways:
/// - at end of stream on a block boundary, by returning `None`;
/// - at end of stream in the middle of a block, by returning [TimeSignError::Truncated] once;
/// - on any other read error, by returning [TimeSignError::Read] once.
///
/// A block that cannot be allocated ends the iterator with [TimeSignError::BlockAllocation].
///
/// After an error the iterator is exhausted. Short reads that are not at end of stream are
/// completed with further reads, so a pipe delivering data in small pieces is not mistaken for a
/// truncated file.
pub struct BlockReader<R> {
    inner: R,
    block_size: usize,
    blocks: u64,
    finished: bool,
}

impl<R: Read> BlockReader<R> {
    /// `block_size` must be positive; see [crate::config::RunConfig::validate].
    pub fn new(inner: R, block_size: usize) -> Self {
        debug_assert!(block_size > 0);
        Self {
            inner,
            block_size,
            blocks: 0,
            finished: false,
        }
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Number of complete blocks returned so far.
    pub fn blocks_read(&self) -> u64 {
        self.blocks
    }

    /// Read until `buf` is full or the stream ends, returning the number of bytes read.
    fn fill(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }

    fn next_block(&mut self) -> Option<TimeSignResult<Vec<u8>>> {
        let mut block = Vec::new();
        if let Err(source) = block.try_reserve_exact(self.block_size) {
            return Some(Err(TimeSignError::BlockAllocation {
                size: self.block_size,
                source,
            }));
        }
        block.resize(self.block_size, 0);
        match self.fill(&mut block) {
            Ok(0) => {
                debug!("End of input after {} blocks", self.blocks);
                None
            }
            Ok(n) if n < self.block_size => Some(Err(TimeSignError::Truncated {
                expected: self.block_size,
                actual: n,
            })),
            Ok(_) => {
                self.blocks += 1;
                Some(Ok(block))
            }
            Err(source) => Some(Err(TimeSignError::Read {
                blocks: self.blocks,
                source,
            })),
        }
    }
}

impl<R: Read> Iterator for BlockReader<R> {
    type Item = TimeSignResult<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let item = self.next_block();
        if !matches!(item, Some(Ok(_))) {
            self.finished = true;
        }
        item
    }
}

impl<R: Read> std::iter::FusedIterator for BlockReader<R> {}
