use std::collections::HashMap;
use std::marker::PhantomData;
use std::thread::{self, ThreadId};
use parking_lot::{Condvar, Mutex};

/// Shared/exclusive locking primitive.
///
/// Every `acquire_*` must be paired with the matching `release_*` on the same
/// thread. Prefer the scoped guards of [`ReadWriteLock`] over calling these
/// directly.
pub trait SharedExclusiveLock: Send + Sync {
    fn acquire_read(&self);

    fn release_read(&self);

    fn acquire_write(&self);

    fn release_write(&self);
}

#[derive(Debug, Default)]
struct LockState {
    /// Read holds per thread (reentrant acquisitions are counted)
    readers: HashMap<ThreadId, usize>,
    writer: Option<ThreadId>,
    write_holds: usize,
    waiting_writers: usize,
}

/// Reentrant, write-preferring read/write lock
///
/// - Any number of threads may hold the read lock at once.
/// - The write lock excludes every other thread, readers included.
/// - A thread may re-acquire a role it already holds, and the writer may also
///   take the read lock. A reader may not upgrade to the write lock.
/// - Once a writer is waiting, threads not already reading are held back, so
///   a steady stream of readers cannot starve a writer.
pub struct ReadWriteLock {
    state: Mutex<LockState>,
    readers_cv: Condvar,
    writers_cv: Condvar,
}

impl ReadWriteLock {
    pub fn new() -> Self {
        ReadWriteLock {
            state: Mutex::new(LockState::default()),
            readers_cv: Condvar::new(),
            writers_cv: Condvar::new(),
        }
    }

    /// Acquire the shared lock, released when the guard drops.
    pub fn read(&self) -> ReadGuard<'_> {
        self.acquire_read();
        ReadGuard {
            lock: self,
            _not_send: PhantomData,
        }
    }

    /// Acquire the exclusive lock, released when the guard drops.
    pub fn write(&self) -> WriteGuard<'_> {
        self.acquire_write();
        WriteGuard {
            lock: self,
            _not_send: PhantomData,
        }
    }

    /// Number of distinct threads currently holding the read lock.
    pub fn active_readers(&self) -> usize {
        self.state.lock().readers.len()
    }

    pub fn is_write_locked(&self) -> bool {
        self.state.lock().writer.is_some()
    }

    pub fn waiting_writers(&self) -> usize {
        self.state.lock().waiting_writers
    }
}

impl Default for ReadWriteLock {
    fn default() -> Self {
        ReadWriteLock::new()
    }
}

impl SharedExclusiveLock for ReadWriteLock {
    fn acquire_read(&self) {
        let me = thread::current().id();
        let mut state = self.state.lock();

        loop {
            // Reentrant holders never wait, otherwise a waiting writer would deadlock them
            let reentrant = state.writer == Some(me) || state.readers.contains_key(&me);
            let free = state.writer.is_none() && state.waiting_writers == 0;
            if reentrant || free {
                break;
            }
            self.readers_cv.wait(&mut state);
        }

        *state.readers.entry(me).or_insert(0) += 1;
    }

    fn release_read(&self) {
        let me = thread::current().id();
        let mut state = self.state.lock();

        let holds = match state.readers.get_mut(&me) {
            Some(holds) => holds,
            None => panic!("release_read called by a thread that does not hold the read lock"),
        };
        *holds -= 1;
        if *holds == 0 {
            state.readers.remove(&me);
        }

        if state.readers.is_empty() && state.waiting_writers > 0 {
            self.writers_cv.notify_one();
        }
    }

    fn acquire_write(&self) {
        let me = thread::current().id();
        let mut state = self.state.lock();

        if state.writer == Some(me) {
            state.write_holds += 1;
            return;
        }
        if state.readers.contains_key(&me) {
            panic!("read lock cannot be upgraded to a write lock");
        }

        state.waiting_writers += 1;
        while state.writer.is_some() || !state.readers.is_empty() {
            self.writers_cv.wait(&mut state);
        }
        state.waiting_writers -= 1;

        state.writer = Some(me);
        state.write_holds = 1;
        tracing::trace!("write lock acquired by {:?}", me);
    }

    fn release_write(&self) {
        let me = thread::current().id();
        let mut state = self.state.lock();

        if state.writer != Some(me) {
            panic!("release_write called by a thread that does not hold the write lock");
        }

        state.write_holds -= 1;
        if state.write_holds > 0 {
            return;
        }
        state.writer = None;

        if state.waiting_writers > 0 {
            self.writers_cv.notify_one();
        } else {
            self.readers_cv.notify_all();
        }
    }
}

/// Scoped shared hold on a [`ReadWriteLock`].
///
/// Not `Send`: holds are tracked per thread and must be released where taken.
pub struct ReadGuard<'a> {
    lock: &'a ReadWriteLock,
    _not_send: PhantomData<*const ()>,
}

impl Drop for ReadGuard<'_> {
    fn drop(&mut self) {
        self.lock.release_read();
    }
}

/// Scoped exclusive hold on a [`ReadWriteLock`].
pub struct WriteGuard<'a> {
    lock: &'a ReadWriteLock,
    _not_send: PhantomData<*const ()>,
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        self.lock.release_write();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::time::Duration;

    #[test]
    fn test_multiple_readers_hold_lock_together() {
        let lock = Arc::new(ReadWriteLock::new());
        let barrier = Arc::new(Barrier::new(3));

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let lock = lock.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    let _guard = lock.read();
                    // Every reader must be inside before any leaves
                    barrier.wait();
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(lock.active_readers(), 0);
    }

    #[test]
    fn test_writer_is_exclusive() {
        let lock = Arc::new(ReadWriteLock::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let lock = lock.clone();
                let inside = inside.clone();
                let max_inside = max_inside.clone();
                thread::spawn(move || {
                    for _ in 0..50 {
                        let _guard = lock.write();
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_inside.fetch_max(now, Ordering::SeqCst);
                        inside.fetch_sub(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
        assert!(!lock.is_write_locked());
    }

    #[test]
    fn test_reentrant_acquisition() {
        let lock = ReadWriteLock::new();

        {
            let _a = lock.read();
            let _b = lock.read();
            assert_eq!(lock.active_readers(), 1);
        }
        assert_eq!(lock.active_readers(), 0);

        {
            let _a = lock.write();
            let _b = lock.write();
            let _c = lock.read();
            assert!(lock.is_write_locked());
        }
        assert!(!lock.is_write_locked());
        assert_eq!(lock.active_readers(), 0);
    }

    #[test]
    fn test_waiting_writer_blocks_new_readers() {
        let lock = Arc::new(ReadWriteLock::new());
        let first_read = lock.read();

        let writer_done = Arc::new(AtomicBool::new(false));
        let writer = {
            let lock = lock.clone();
            let writer_done = writer_done.clone();
            thread::spawn(move || {
                let _guard = lock.write();
                writer_done.store(true, Ordering::SeqCst);
            })
        };

        while lock.waiting_writers() == 0 {
            thread::sleep(Duration::from_millis(1));
        }

        let reader_saw_writer = Arc::new(AtomicBool::new(false));
        let reader = {
            let lock = lock.clone();
            let writer_done = writer_done.clone();
            let reader_saw_writer = reader_saw_writer.clone();
            thread::spawn(move || {
                let _guard = lock.read();
                reader_saw_writer.store(writer_done.load(Ordering::SeqCst), Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(50));
        drop(first_read);

        writer.join().unwrap();
        reader.join().unwrap();
        assert!(reader_saw_writer.load(Ordering::SeqCst));
    }

    #[test]
    #[should_panic(expected = "cannot be upgraded")]
    fn test_upgrade_is_rejected() {
        let lock = ReadWriteLock::new();
        let _read = lock.read();
        let _write = lock.write();
    }
}
