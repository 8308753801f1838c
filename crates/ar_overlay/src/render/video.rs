//! Video frame hand-off between the camera thread and the render thread
//!
//! The camera source pushes frames at its own rate through a [`VideoFrameSink`].
//! The render thread takes whatever frame is pending at the start of a tick and
//! uploads it; frames pushed in between are superseded (last write wins).

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::render::{RenderError, RenderResult};

#[derive(Debug, Default)]
struct Mailbox {
    pending: Option<Vec<u8>>,
    delivered: u64,
    superseded: u64,
}

/// Counters describing frame delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VideoStats {
    /// Frames accepted from the producer
    pub delivered: u64,
    /// Frames replaced by a newer one before the render thread picked them up
    pub superseded: u64,
}

fn lock(mailbox: &Mutex<Mailbox>) -> MutexGuard<'_, Mailbox> {
    // A panicking producer cannot leave the mailbox half-written.
    mailbox.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Producer handle for camera frames
///
/// Cheap to clone and safe to move to the camera thread.
#[derive(Debug, Clone)]
pub struct VideoFrameSink {
    mailbox: Arc<Mutex<Mailbox>>,
    frame_len: usize,
}

impl VideoFrameSink {
    /// Offer a new RGBA8 frame
    ///
    /// The buffer must hold exactly the number of bytes agreed at construction.
    /// Any frame still waiting for upload is dropped in favour of this one.
    pub fn push_frame(&self, pixels: Vec<u8>) -> RenderResult<()> {
        if pixels.len() != self.frame_len {
            return Err(RenderError::FrameSizeMismatch { expected: self.frame_len, actual: pixels.len() });
        }

        let mut mailbox = lock(&self.mailbox);
        if mailbox.pending.replace(pixels).is_some() {
            mailbox.superseded += 1;
        }
        mailbox.delivered += 1;
        Ok(())
    }

    /// Bytes expected per frame
    pub const fn frame_len(&self) -> usize {
        self.frame_len
    }
}

/// Consumer side owned by the renderer
#[derive(Debug)]
pub(crate) struct VideoMailbox {
    mailbox: Arc<Mutex<Mailbox>>,
    frame_len: usize,
}

impl VideoMailbox {
    pub(crate) fn new(frame_len: usize) -> Self {
        Self { mailbox: Arc::new(Mutex::new(Mailbox::default())), frame_len }
    }

    pub(crate) fn sink(&self) -> VideoFrameSink {
        VideoFrameSink { mailbox: Arc::clone(&self.mailbox), frame_len: self.frame_len }
    }

    /// Take the pending frame, if any
    pub(crate) fn take(&self) -> Option<Vec<u8>> {
        lock(&self.mailbox).pending.take()
    }

    /// Put a frame back if its upload could not happen
    ///
    /// A newer frame that arrived meanwhile is kept instead.
    pub(crate) fn restore(&self, pixels: Vec<u8>) {
        let mut mailbox = lock(&self.mailbox);
        if mailbox.pending.is_none() {
            mailbox.pending = Some(pixels);
        }
    }

    pub(crate) fn stats(&self) -> VideoStats {
        let mailbox = lock(&self.mailbox);
        VideoStats { delivered: mailbox.delivered, superseded: mailbox.superseded }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_frame_wins() {
        let mailbox = VideoMailbox::new(4);
        let sink = mailbox.sink();

        sink.push_frame(vec![1; 4]).unwrap();
        sink.push_frame(vec![2; 4]).unwrap();

        assert_eq!(mailbox.take(), Some(vec![2; 4]));
        assert_eq!(mailbox.take(), None);
        assert_eq!(mailbox.stats(), VideoStats { delivered: 2, superseded: 1 });
    }

    #[test]
    fn test_wrong_size_is_rejected() {
        let mailbox = VideoMailbox::new(4);
        let result = mailbox.sink().push_frame(vec![0; 3]);

        assert!(matches!(result, Err(RenderError::FrameSizeMismatch { expected: 4, actual: 3 })));
        assert_eq!(mailbox.take(), None);
    }

    #[test]
    fn test_restore_does_not_overwrite_newer_frame() {
        let mailbox = VideoMailbox::new(1);
        let sink = mailbox.sink();

        sink.push_frame(vec![1]).unwrap();
        let taken = mailbox.take().unwrap();
        sink.push_frame(vec![2]).unwrap();
        mailbox.restore(taken);

        assert_eq!(mailbox.take(), Some(vec![2]));
    }

    #[test]
    fn test_frames_cross_threads() {
        let mailbox = VideoMailbox::new(2);
        let sink = mailbox.sink();

        let producer = std::thread::spawn(move || {
            for value in 0..10u8 {
                sink.push_frame(vec![value; 2]).unwrap();
            }
        });
        producer.join().unwrap();

        assert_eq!(mailbox.take(), Some(vec![9; 2]));
        assert_eq!(mailbox.stats().delivered, 10);
    }
}
