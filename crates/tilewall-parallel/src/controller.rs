//! Process Controllers
//!
//! Rank bookkeeping and the two collective operations compositing needs.
//! Rank 0 is the root.

use std::sync::mpsc::{self, Receiver, Sender};

use tilewall_image::RawImage;

use crate::ControllerError;

/// Multi-process controller (MPI-like)
pub trait ProcessController: Send {
    /// This process's rank
    fn rank(&self) -> usize;

    /// Number of cooperating processes
    fn num_processes(&self) -> usize;

    /// Collect one image from every rank on the root.
    ///
    /// Root receives `Some` with images in rank order, other ranks `None`.
    fn gather(&self, image: RawImage) -> Result<Option<Vec<RawImage>>, ControllerError>;

    /// Hand rank `i` the `i`-th image. Only the root's argument is used.
    fn scatter(&self, images: Option<Vec<RawImage>>) -> Result<RawImage, ControllerError>;

    fn is_root(&self) -> bool {
        self.rank() == 0
    }
}

/// Single-process controller
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalController;

impl ProcessController for LocalController {
    fn rank(&self) -> usize {
        0
    }

    fn num_processes(&self) -> usize {
        1
    }

    fn gather(&self, image: RawImage) -> Result<Option<Vec<RawImage>>, ControllerError> {
        Ok(Some(vec![image]))
    }

    fn scatter(&self, images: Option<Vec<RawImage>>) -> Result<RawImage, ControllerError> {
        let mut images = images.unwrap_or_default();
        if images.len() != 1 {
            return Err(ControllerError::RankMismatch {
                expected: 1,
                actual: images.len(),
            });
        }
        Ok(images.remove(0))
    }
}

/// Builds a group of in-process ranks connected by channels
pub struct ThreadGroup;

impl ThreadGroup {
    /// Create `size` connected controllers, index = rank.
    ///
    /// Move each controller onto its own thread; every collective call
    /// must be made by all ranks.
    pub fn new(size: usize) -> Vec<ThreadController> {
        let size = size.max(1);
        let mut from_ranks = Vec::with_capacity(size - 1);
        let mut to_ranks = Vec::with_capacity(size - 1);
        let mut members = Vec::with_capacity(size - 1);

        for rank in 1..size {
            let (up_tx, up_rx) = mpsc::channel();
            let (down_tx, down_rx) = mpsc::channel();
            from_ranks.push(up_rx);
            to_ranks.push(down_tx);
            members.push(ThreadController {
                rank,
                size,
                link: Link::Member {
                    to_root: up_tx,
                    from_root: down_rx,
                },
            });
        }

        let root = ThreadController {
            rank: 0,
            size,
            link: Link::Root { from_ranks, to_ranks },
        };

        std::iter::once(root).chain(members).collect()
    }
}

enum Link {
    Root {
        from_ranks: Vec<Receiver<RawImage>>,
        to_ranks: Vec<Sender<RawImage>>,
    },
    Member {
        to_root: Sender<RawImage>,
        from_root: Receiver<RawImage>,
    },
}

/// One rank of a `ThreadGroup`
pub struct ThreadController {
    rank: usize,
    size: usize,
    link: Link,
}

impl ProcessController for ThreadController {
    fn rank(&self) -> usize {
        self.rank
    }

    fn num_processes(&self) -> usize {
        self.size
    }

    fn gather(&self, image: RawImage) -> Result<Option<Vec<RawImage>>, ControllerError> {
        match &self.link {
            Link::Root { from_ranks, .. } => {
                let mut images = Vec::with_capacity(self.size);
                images.push(image);
                for (i, rx) in from_ranks.iter().enumerate() {
                    let rank = i + 1;
                    images.push(rx.recv().map_err(|_| ControllerError::Disconnected { rank })?);
                }
                tracing::debug!("Gathered {} images on root", images.len());
                Ok(Some(images))
            }
            Link::Member { to_root, .. } => {
                to_root
                    .send(image)
                    .map_err(|_| ControllerError::Disconnected { rank: 0 })?;
                Ok(None)
            }
        }
    }

    fn scatter(&self, images: Option<Vec<RawImage>>) -> Result<RawImage, ControllerError> {
        match &self.link {
            Link::Root { to_ranks, .. } => {
                let images = images.unwrap_or_default();
                if images.len() != self.size {
                    return Err(ControllerError::RankMismatch {
                        expected: self.size,
                        actual: images.len(),
                    });
                }
                let mut images = images.into_iter();
                let own = images.next().unwrap_or_default();
                for (i, (tx, image)) in to_ranks.iter().zip(images).enumerate() {
                    let rank = i + 1;
                    tx.send(image).map_err(|_| ControllerError::Disconnected { rank })?;
                }
                Ok(own)
            }
            Link::Member { from_root, .. } => from_root
                .recv()
                .map_err(|_| ControllerError::Disconnected { rank: 0 }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use tilewall_image::Color;

    #[test]
    fn test_local_controller() {
        let controller = LocalController;
        assert!(controller.is_root());
        assert_eq!(controller.num_processes(), 1);

        let gathered = controller.gather(RawImage::blank(1, 1)).unwrap().unwrap();
        assert_eq!(gathered.len(), 1);

        let err = controller.scatter(Some(Vec::new())).unwrap_err();
        assert_eq!(err, ControllerError::RankMismatch { expected: 1, actual: 0 });
    }

    #[test]
    fn test_thread_group_gather_scatter() {
        let controllers = ThreadGroup::new(3);
        assert_eq!(controllers.len(), 3);

        let handles: Vec<_> = controllers
            .into_iter()
            .map(|controller| {
                thread::spawn(move || {
                    let shade = controller.rank() as u8 * 100;
                    let local = RawImage::filled(1, 1, Color::rgb(shade, 0, 0));
                    let gathered = controller.gather(local).unwrap();

                    let shares = gathered.map(|images| {
                        let reds: Vec<_> = images.iter().map(|img| img.pixel(0, 0).unwrap().r).collect();
                        assert_eq!(reds, vec![0, 100, 200]);
                        // Send every rank the image that came from the next rank
                        (0..3).map(|i| images[(i + 1) % 3].clone()).collect()
                    });
                    let mine = controller.scatter(shares).unwrap();
                    (controller.rank(), mine.pixel(0, 0).unwrap().r)
                })
            })
            .collect();

        let mut results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        results.sort();
        assert_eq!(results, vec![(0, 100), (1, 200), (2, 0)]);
    }

    #[test]
    fn test_disconnected_rank() {
        let mut controllers = ThreadGroup::new(2);
        let member = controllers.pop().unwrap();
        drop(member);

        let root = controllers.pop().unwrap();
        let err = root.gather(RawImage::new()).unwrap_err();
        assert_eq!(err, ControllerError::Disconnected { rank: 1 });
    }
}
