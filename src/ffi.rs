use crate::Core::registers::{LnicRegisters, MmioQueue};
use crate::LNIC::{Endpoint, LengthMode, RoleBuilder};
use crate::error::LnicError;
use std::ptr;

// Error codes; validation failures use LnicError::code()
pub const LNIC_SUCCESS: i32 = 0;
pub const LNIC_ERROR_NULL_POINTER: i32 = -1;

/// Handle to one core's endpoint (opaque pointer)
pub struct EndpointHandle {
    inner: Endpoint<MmioQueue>,
}

fn to_code<T>(result: Result<T, LnicError>) -> i32 {
    match result {
        Ok(_) => LNIC_SUCCESS,
        Err(e) => {
            tracing::error!("FFI Error: {}", e);
            e.code()
        }
    }
}

// -----------------------------------------------------------------------------
// Setup
// -----------------------------------------------------------------------------

/// Create an endpoint over a mapped register block.
///
/// # Arguments
/// * `regs` - Pointer to the core's `LnicRegisters` block. Must stay mapped
///   until the handle is freed.
///
/// # Returns
/// * Pointer to `EndpointHandle`, or NULL if `regs` is NULL.
#[no_mangle]
pub extern "C" fn lnic_endpoint_new(regs: *mut LnicRegisters) -> *mut EndpointHandle {
    match unsafe { MmioQueue::new(regs) } {
        Some(queue) => Box::into_raw(Box::new(EndpointHandle {
            inner: Endpoint::new(queue),
        })),
        None => {
            tracing::error!("FFI Error: register block pointer is NULL");
            ptr::null_mut()
        }
    }
}

/// Register a context for this core.
///
/// # Returns
/// * 0 on success, negative error code otherwise.
#[no_mangle]
pub extern "C" fn lnic_add_context(handle: *mut EndpointHandle, context_id: u64, priority: u64) -> i32 {
    if handle.is_null() {
        return LNIC_ERROR_NULL_POINTER;
    }
    let endpoint = unsafe { &mut (*handle).inner };
    to_code(endpoint.add_context(context_id, priority))
}

/// Free an endpoint handle.
#[no_mangle]
pub extern "C" fn lnic_endpoint_free(handle: *mut EndpointHandle) {
    if !handle.is_null() {
        unsafe {
            let _ = Box::from_raw(handle); // Dropped automatically
        }
    }
}

// -----------------------------------------------------------------------------
// Role entry points
// -----------------------------------------------------------------------------

/// Run the client role: `n_iterations` one-word requests to the server.
///
/// # Returns
/// * 0 if every response validated and the RX queue drained.
/// * Negative error code otherwise.
#[no_mangle]
pub extern "C" fn lnic_run_client(
    handle: *mut EndpointHandle,
    n_iterations: u64,
    server_address: u32,
    server_context: u16,
) -> i32 {
    if handle.is_null() {
        return LNIC_ERROR_NULL_POINTER;
    }
    let endpoint = unsafe { &mut (*handle).inner };

    let config = RoleBuilder::new()
        .with_iterations(n_iterations)
        .with_server(server_address, server_context)
        .build_client();
    to_code(config.and_then(|config| endpoint.run_client(&config)))
}

/// Run the server role: echo `n_iterations` requests.
#[no_mangle]
pub extern "C" fn lnic_run_server(handle: *mut EndpointHandle, n_iterations: u64) -> i32 {
    if handle.is_null() {
        return LNIC_ERROR_NULL_POINTER;
    }
    let endpoint = unsafe { &mut (*handle).inner };

    let config = RoleBuilder::new().with_iterations(n_iterations).build_server();
    to_code(config.and_then(|config| endpoint.run_server(&config)))
}

/// Echo messages forever.
///
/// `fixed_length` of 0 accepts any length; otherwise only messages of exactly
/// that many bytes are accepted. Only returns on a validation failure.
#[no_mangle]
pub extern "C" fn lnic_run_passthrough_loop(handle: *mut EndpointHandle, fixed_length: u16) -> i32 {
    if handle.is_null() {
        return LNIC_ERROR_NULL_POINTER;
    }
    let endpoint = unsafe { &mut (*handle).inner };

    let mode = match fixed_length {
        0 => LengthMode::Variable,
        len => LengthMode::Fixed(len),
    };
    to_code(endpoint.run_passthrough_loop(mode))
}
