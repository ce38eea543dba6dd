use crate::monitoring::domain::wire_protocol::REQUEST_FRAME_LEN;
use crate::ports::outbound::{DriverPort, PortConnection};
use crate::shared::error::ChannelError;
use async_trait::async_trait;
use std::ffi::c_void;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use windows_sys::Win32::Foundation::{CloseHandle, HANDLE, INVALID_HANDLE_VALUE};
use windows_sys::Win32::System::IO::CancelIoEx;

/// Handle opened for synchronous I/O so `FilterGetMessage` can block without
/// an OVERLAPPED structure.
const FLT_PORT_FLAG_SYNC_HANDLE: u32 = 0x0000_0001;

/// Frames buffered between the reader thread and the channel.
const FRAME_QUEUE_DEPTH: usize = 16;

#[link(name = "fltlib")]
extern "system" {
    fn FilterConnectCommunicationPort(
        lpPortName: *const u16,
        dwOptions: u32,
        lpContext: *const c_void,
        wSizeOfContext: u16,
        lpSecurityAttributes: *const c_void,
        hPort: *mut HANDLE,
    ) -> i32;

    fn FilterGetMessage(
        hPort: HANDLE,
        lpMessageBuffer: *mut c_void,
        dwMessageBufferSize: u32,
        lpOverlapped: *mut c_void,
    ) -> i32;

    fn FilterReplyMessage(hPort: HANDLE, lpReplyBuffer: *const c_void, dwReplyBufferSize: u32) -> i32;
}

#[derive(Clone, Copy)]
struct PortHandle(HANDLE);

// SAFETY: a filter port handle is a kernel object reference usable from any
// thread. Close is coordinated through `closed`.
unsafe impl Send for PortHandle {}
unsafe impl Sync for PortHandle {}

fn hresult_details(call: &str, hr: i32) -> String {
    format!("{call} failed with HRESULT 0x{:08X}", hr as u32)
}

/// Filter-manager communication port transport.
pub struct FilterDriverPort;

#[async_trait]
impl DriverPort for FilterDriverPort {
    async fn connect(&self, port_name: &str) -> Result<Box<dyn PortConnection>, ChannelError> {
        let wide: Vec<u16> = port_name.encode_utf16().chain(std::iter::once(0)).collect();
        let mut handle: HANDLE = INVALID_HANDLE_VALUE;

        // SAFETY: `wide` is NUL-terminated and outlives the call; `handle` is
        // a valid out pointer.
        let hr = unsafe {
            FilterConnectCommunicationPort(
                wide.as_ptr(),
                FLT_PORT_FLAG_SYNC_HANDLE,
                std::ptr::null(),
                0,
                std::ptr::null(),
                &mut handle,
            )
        };
        if hr < 0 || handle == INVALID_HANDLE_VALUE || handle.is_null() {
            return Err(ChannelError::ConnectFailed {
                port: port_name.to_string(),
                details: hresult_details("FilterConnectCommunicationPort", hr),
            });
        }

        Ok(Box::new(FilterConnection::spawn(PortHandle(handle))))
    }
}

/// One open port. A dedicated thread blocks in `FilterGetMessage` and hands
/// frames to the async side through a bounded queue.
struct FilterConnection {
    handle: PortHandle,
    closed: Arc<AtomicBool>,
    frames: mpsc::Receiver<Result<Vec<u8>, ChannelError>>,
}

impl FilterConnection {
    fn spawn(handle: PortHandle) -> Self {
        let closed = Arc::new(AtomicBool::new(false));
        let (tx, frames) = mpsc::channel(FRAME_QUEUE_DEPTH);
        let reader_closed = Arc::clone(&closed);

        std::thread::spawn(move || read_loop(handle, reader_closed, tx));

        Self { handle, closed, frames }
    }
}

fn read_loop(handle: PortHandle, closed: Arc<AtomicBool>, tx: mpsc::Sender<Result<Vec<u8>, ChannelError>>) {
    loop {
        let mut frame = vec![0u8; REQUEST_FRAME_LEN];
        // SAFETY: the buffer is exactly REQUEST_FRAME_LEN bytes and lives
        // across the blocking call.
        let hr = unsafe {
            FilterGetMessage(
                handle.0,
                frame.as_mut_ptr().cast(),
                REQUEST_FRAME_LEN as u32,
                std::ptr::null_mut(),
            )
        };

        if closed.load(Ordering::SeqCst) {
            return;
        }
        let item = if hr < 0 {
            Err(ChannelError::Io {
                details: hresult_details("FilterGetMessage", hr),
            })
        } else {
            Ok(frame)
        };
        let fatal = item.is_err();
        if tx.blocking_send(item).is_err() || fatal {
            return;
        }
    }
}

#[async_trait]
impl PortConnection for FilterConnection {
    async fn receive(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>, ChannelError> {
        match tokio::time::timeout(timeout, self.frames.recv()).await {
            Err(_) => Ok(None),
            Ok(Some(frame)) => frame.map(Some),
            Ok(None) => Err(ChannelError::Io {
                details: "driver reader stopped".to_string(),
            }),
        }
    }

    async fn reply(&mut self, frame: &[u8]) -> Result<usize, ChannelError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ChannelError::NotConnected);
        }
        // SAFETY: `frame` is a complete reply frame (header plus body) that
        // outlives the call.
        let hr = unsafe { FilterReplyMessage(self.handle.0, frame.as_ptr().cast(), frame.len() as u32) };
        if hr < 0 {
            return Err(ChannelError::Io {
                details: hresult_details("FilterReplyMessage", hr),
            });
        }
        Ok(frame.len())
    }

    fn close(&mut self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        // SAFETY: the handle came from FilterConnectCommunicationPort and is
        // closed exactly once, guarded by `closed`.
        unsafe {
            CancelIoEx(self.handle.0, std::ptr::null());
            CloseHandle(self.handle.0);
        }
        self.frames.close();
    }
}

impl Drop for FilterConnection {
    fn drop(&mut self) {
        self.close();
    }
}
