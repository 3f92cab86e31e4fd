use libc::{c_char, c_void};
use nfio_errors::{Interposer, NfioError, Resolver, Symbol};
use std::ffi::CStr;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Counts lookups; resolves only the real strerror.
struct CountingResolver {
    lookups: AtomicUsize,
}

impl Resolver for CountingResolver {
    fn resolve(&self, symbol: Symbol) -> Option<NonNull<c_void>> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        match symbol {
            Symbol::Strerror => NonNull::new(libc::strerror as *mut c_void),
            _ => None,
        }
    }
}

#[test]
fn test_concurrent_lookups_share_table() {
    let interposer = Arc::new(Interposer::builtin(CountingResolver {
        lookups: AtomicUsize::new(0),
    }));
    let restart = NfioError::VnfRestart.code();
    let expected = unsafe { interposer.strerror(restart) }.unwrap() as usize;

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let interposer = Arc::clone(&interposer);
            std::thread::spawn(move || {
                let mut buf = [0 as c_char; 64];
                for i in 0..1000 {
                    let err = NfioError::ALL[(t + i) % NfioError::ALL.len()];
                    let p = unsafe { interposer.strerror(err.code()) }.unwrap();
                    let msg = unsafe { CStr::from_ptr(p) };
                    assert_eq!(msg.to_bytes(), err.builtin_message());

                    let len = buf.len();
                    let rc = unsafe {
                        interposer.strerror_r_xsi(err.code(), buf.as_mut_ptr(), len)
                    };
                    assert_eq!(rc, Ok(0));
                    assert_eq!(
                        unsafe { CStr::from_ptr(buf.as_ptr()) }.to_bytes(),
                        err.builtin_message()
                    );

                    let p = unsafe { interposer.strerror(restart) }.unwrap();
                    assert_eq!(p as usize, expected);
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    // Reserved codes never touch the resolver
    assert_eq!(interposer.resolver().lookups.load(Ordering::Relaxed), 0);
}
