use parking_lot::Mutex;
use std::collections::VecDeque;

/// A unit of deferred work that runs against some shared context.
pub trait Request<Ctx: ?Sized> {
    fn run(self, ctx: &Ctx);
}

/// Lock-guarded FIFO for handing work from any thread to the thread that drains it.
///
/// The lock is only held to push or pop. Requests run with the queue unlocked, so a request may enqueue more work
/// without deadlocking. A drain only processes the requests that were pending when it started; anything enqueued
/// during the drain waits for the next one.
pub struct RequestQueue<R> {
    queue: Mutex<VecDeque<R>>,
}

impl<R> Default for RequestQueue<R> {
    fn default() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
        }
    }
}

impl<R> RequestQueue<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&self, request: R) {
        self.queue.lock().push_back(request);
    }

    pub fn clear(&self) {
        self.queue.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    /// Pops every pending request in FIFO order and hands it to `handle`. Returns the number handled.
    pub fn drain(&self, handle: impl FnMut(R)) -> usize {
        let pending = self.len();
        self.drain_max(pending, handle)
    }

    /// Like [`RequestQueue::drain`], but handles at most `max` requests.
    pub fn drain_max(&self, max: usize, mut handle: impl FnMut(R)) -> usize {
        let mut handled = 0;
        while handled < max {
            // Pop in its own statement so the guard is dropped before `handle` runs.
            let next = self.queue.lock().pop_front();
            match next {
                Some(request) => handle(request),
                None => break,
            }
            handled += 1;
        }
        handled
    }

    pub fn run_requests<Ctx: ?Sized>(&self, ctx: &Ctx) -> usize
    where
        R: Request<Ctx>,
    {
        self.drain(|request| request.run(ctx))
    }

    pub fn run_requests_max<Ctx: ?Sized>(&self, ctx: &Ctx, max: usize) -> usize
    where
        R: Request<Ctx>,
    {
        self.drain_max(max, |request| request.run(ctx))
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝

#[cfg(test)]
mod test {
    use super::*;

    use std::sync::Arc;

    struct Push(u32);

    impl Request<Mutex<Vec<u32>>> for Push {
        fn run(self, log: &Mutex<Vec<u32>>) {
            log.lock().push(self.0);
        }
    }

    #[test]
    fn requests_run_in_fifo_order() {
        let queue = RequestQueue::new();
        for i in 0..5 {
            queue.enqueue(Push(i));
        }
        let log = Mutex::new(Vec::new());
        assert_eq!(queue.run_requests(&log), 5);
        assert_eq!(*log.lock(), [0, 1, 2, 3, 4]);
        assert!(queue.is_empty());
    }

    #[test]
    fn run_requests_max_leaves_the_rest_queued() {
        let queue = RequestQueue::new();
        for i in 0..5 {
            queue.enqueue(Push(i));
        }
        let log = Mutex::new(Vec::new());
        assert_eq!(queue.run_requests_max(&log, 2), 2);
        assert_eq!(*log.lock(), [0, 1]);
        assert_eq!(queue.len(), 3);

        queue.clear();
        assert_eq!(queue.run_requests(&log), 0);
    }

    #[test]
    fn work_enqueued_during_a_drain_waits_for_the_next_one() {
        let queue = RequestQueue::new();
        queue.enqueue(1);
        queue.enqueue(2);

        let mut seen = Vec::new();
        let handled = queue.drain(|n| {
            seen.push(n);
            queue.enqueue(n * 10);
        });
        assert_eq!(handled, 2);
        assert_eq!(seen, [1, 2]);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn producers_on_many_threads() {
        let queue = Arc::new(RequestQueue::new());
        crossbeam::scope(|s| {
            for t in 0..4 {
                let queue = queue.clone();
                s.spawn(move |_| {
                    for i in 0..100 {
                        queue.enqueue(Push(t * 1000 + i));
                    }
                });
            }
        })
        .unwrap();

        let log = Mutex::new(Vec::new());
        assert_eq!(queue.run_requests(&log), 400);

        // Each producer's requests keep their relative order.
        let log = log.into_inner();
        for t in 0..4 {
            let mine: Vec<u32> = log.iter().copied().filter(|n| n / 1000 == t).collect();
            assert_eq!(mine, (0..100).map(|i| t * 1000 + i).collect::<Vec<_>>());
        }
    }
}
