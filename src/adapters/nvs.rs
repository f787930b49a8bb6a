//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`SessionStore`] and [`ConfigStore`] on top of ESP-IDF NVS.
//! Records are postcard blobs under fixed keys in the `brewkettle`
//! namespace; NVS commits are atomic per nvs_commit(), so a power cut
//! mid-save leaves the previous blob intact.
//!
//! Config blobs are range-validated before persistence — a bad field is
//! rejected outright, never clamped into range.
//!
//! The simulation backend is an in-memory map (dev/test only).

use log::{info, warn};

use crate::app::ports::{ConfigStore, SessionStore};
use crate::app::session::BrewSession;
use crate::config::{validate_config, BoilProfile, BrewConfig, MashProfile};
use crate::error::StoreError;

#[cfg(not(target_os = "espidf"))]
use std::cell::RefCell;
#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

const NAMESPACE: &str = "brewkettle";
const SESSION_KEY: &str = "session";
const CONFIG_KEY: &str = "brewcfg";
const MASH_PROFILE_KEY: &str = "mashprof";
const BOIL_PROFILE_KEY: &str = "boilprof";

#[allow(dead_code)]
const MAX_BLOB_SIZE: usize = 4000;

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    store: RefCell<HashMap<String, Vec<u8>>>,
}

impl NvsAdapter {
    /// Create the adapter and initialise NVS flash.
    ///
    /// On first boot or after a partition version mismatch the NVS
    /// partition is erased and re-initialised automatically.
    pub fn new() -> Result<Self, StoreError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: nvs_flash_init / nvs_flash_erase are called from the
            // single main-task context before any concurrent NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK {
                    return Err(StoreError::IoError);
                }
                if unsafe { nvs_flash_init() } != ESP_OK {
                    return Err(StoreError::IoError);
                }
            } else if ret != ESP_OK {
                return Err(StoreError::IoError);
            }
            info!("NvsAdapter: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsAdapter: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            store: RefCell::new(HashMap::new()),
        })
    }

    /// Open the NVS namespace, execute a closure with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let mut ns_buf = [0u8; 16];
        let ns_bytes = NAMESPACE.as_bytes();
        let len = ns_bytes.len().min(15);
        ns_buf[..len].copy_from_slice(&ns_bytes[..len]);

        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        let ret = unsafe { nvs_open(ns_buf.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }

        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }

    #[cfg(target_os = "espidf")]
    fn key_cstr(key: &str) -> [u8; 16] {
        let mut buf = [0u8; 16];
        let kb = key.as_bytes();
        let kl = kb.len().min(15);
        buf[..kl].copy_from_slice(&kb[..kl]);
        buf
    }

    // ── Raw blob access, dual-target ──────────────────────────

    fn read_blob(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        #[cfg(not(target_os = "espidf"))]
        {
            self.store
                .borrow()
                .get(key)
                .cloned()
                .ok_or(StoreError::NotFound)
        }

        #[cfg(target_os = "espidf")]
        {
            let key_buf = Self::key_cstr(key);
            let result = Self::with_nvs_handle(false, |handle| {
                let mut size: usize = 0;
                let ret = unsafe {
                    nvs_get_blob(
                        handle,
                        key_buf.as_ptr() as *const _,
                        core::ptr::null_mut(),
                        &mut size,
                    )
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                if size == 0 || size > MAX_BLOB_SIZE {
                    return Err(ESP_ERR_NVS_INVALID_LENGTH);
                }

                let mut buf = vec![0u8; size];
                let ret = unsafe {
                    nvs_get_blob(
                        handle,
                        key_buf.as_ptr() as *const _,
                        buf.as_mut_ptr() as *mut _,
                        &mut size,
                    )
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(buf)
            });
            match result {
                Ok(bytes) => Ok(bytes),
                Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Err(StoreError::NotFound),
                Err(e) if e == ESP_ERR_NVS_INVALID_LENGTH => Err(StoreError::Corrupted),
                Err(_) => Err(StoreError::IoError),
            }
        }
    }

    fn write_blob(&mut self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        #[cfg(not(target_os = "espidf"))]
        {
            self.store
                .borrow_mut()
                .insert(key.to_string(), bytes.to_vec());
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let key_buf = Self::key_cstr(key);
            let result = Self::with_nvs_handle(true, |handle| {
                let ret = unsafe {
                    nvs_set_blob(
                        handle,
                        key_buf.as_ptr() as *const _,
                        bytes.as_ptr() as *const _,
                        bytes.len(),
                    )
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                let ret = unsafe { nvs_commit(handle) };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(())
            });
            match result {
                Ok(()) => Ok(()),
                Err(e) if e == ESP_ERR_NVS_NOT_ENOUGH_SPACE => Err(StoreError::Full),
                Err(e) => {
                    warn!("NvsAdapter: NVS write error {} (key '{}')", e, key);
                    Err(StoreError::IoError)
                }
            }
        }
    }
}

impl SessionStore for NvsAdapter {
    fn load_session(&self) -> Result<Option<BrewSession>, StoreError> {
        match self.read_blob(SESSION_KEY) {
            Ok(bytes) => {
                let session: BrewSession =
                    postcard::from_bytes(&bytes).map_err(|_| StoreError::Corrupted)?;
                info!("NvsAdapter: session loaded ({} bytes)", bytes.len());
                Ok(Some(session))
            }
            Err(StoreError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn save_session(&mut self, session: &BrewSession) -> Result<(), StoreError> {
        let bytes = postcard::to_allocvec(session).map_err(|_| StoreError::IoError)?;
        self.write_blob(SESSION_KEY, &bytes)
    }
}

impl ConfigStore for NvsAdapter {
    fn load_config(&self) -> Result<BrewConfig, StoreError> {
        match self.read_blob(CONFIG_KEY) {
            Ok(bytes) => {
                let cfg: BrewConfig =
                    postcard::from_bytes(&bytes).map_err(|_| StoreError::Corrupted)?;
                info!("NvsAdapter: config loaded ({} bytes)", bytes.len());
                Ok(cfg)
            }
            Err(StoreError::NotFound) => {
                info!("NvsAdapter: no stored config, using defaults");
                Ok(BrewConfig::default())
            }
            Err(e) => Err(e),
        }
    }

    fn save_config(&mut self, config: &BrewConfig) -> Result<(), StoreError> {
        validate_config(config)?;
        let bytes = postcard::to_allocvec(config).map_err(|_| StoreError::IoError)?;
        self.write_blob(CONFIG_KEY, &bytes)
    }

    fn load_mash_profile(&self) -> Result<MashProfile, StoreError> {
        match self.read_blob(MASH_PROFILE_KEY) {
            Ok(bytes) => postcard::from_bytes(&bytes).map_err(|_| StoreError::Corrupted),
            // Missing profile is normal before the first recipe upload; the
            // sequencer substitutes its single-infusion fallback.
            Err(StoreError::NotFound) => Ok(MashProfile::default()),
            Err(e) => Err(e),
        }
    }

    fn load_boil_profile(&self) -> Result<BoilProfile, StoreError> {
        match self.read_blob(BOIL_PROFILE_KEY) {
            Ok(bytes) => postcard::from_bytes(&bytes).map_err(|_| StoreError::Corrupted),
            Err(StoreError::NotFound) => Ok(BoilProfile::default()),
            Err(e) => Err(e),
        }
    }
}

impl NvsAdapter {
    /// Persist recipe profiles (used by the provisioning flow).
    pub fn save_mash_profile(&mut self, profile: &MashProfile) -> Result<(), StoreError> {
        let bytes = postcard::to_allocvec(profile).map_err(|_| StoreError::IoError)?;
        self.write_blob(MASH_PROFILE_KEY, &bytes)
    }

    pub fn save_boil_profile(&mut self, profile: &BoilProfile) -> Result<(), StoreError> {
        let bytes = postcard::to_allocvec(profile).map_err(|_| StoreError::IoError)?;
        self.write_blob(BOIL_PROFILE_KEY, &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::session::Stage;
    use crate::config::MashStep;

    #[test]
    fn missing_session_loads_as_none() {
        let nvs = NvsAdapter::new().unwrap();
        assert_eq!(nvs.load_session().unwrap(), None);
    }

    #[test]
    fn session_round_trip() {
        let mut nvs = NvsAdapter::new().unwrap();
        let session = BrewSession {
            brew_started: true,
            active_stage: Stage::Mash,
            mash_step: Some(1),
            start_time: Some(1_700_000_000),
            end_time: Some(1_700_003_600),
            time_now: 1_700_000_100,
            current_temperature: 65.4,
            ..Default::default()
        };
        nvs.save_session(&session).unwrap();
        assert_eq!(nvs.load_session().unwrap(), Some(session));
    }

    #[test]
    fn corrupted_session_blob_is_reported() {
        let mut nvs = NvsAdapter::new().unwrap();
        nvs.write_blob(SESSION_KEY, &[0xFF; 3]).unwrap();
        assert_eq!(nvs.load_session(), Err(StoreError::Corrupted));
    }

    #[test]
    fn missing_config_falls_back_to_defaults() {
        let nvs = NvsAdapter::new().unwrap();
        assert_eq!(nvs.load_config().unwrap(), BrewConfig::default());
    }

    #[test]
    fn invalid_config_is_rejected_not_clamped() {
        let mut nvs = NvsAdapter::new().unwrap();
        let bad = BrewConfig {
            boil_power_percent: 150.0,
            ..Default::default()
        };
        assert!(matches!(
            nvs.save_config(&bad),
            Err(StoreError::ValidationFailed(_))
        ));
        // Nothing was written.
        assert_eq!(nvs.load_config().unwrap(), BrewConfig::default());
    }

    #[test]
    fn mash_profile_round_trip() {
        let mut nvs = NvsAdapter::new().unwrap();
        let mut steps = heapless::Vec::new();
        steps
            .push(MashStep {
                target_temperature_c: 62.0,
                duration_mins: 40,
            })
            .unwrap();
        let profile = MashProfile { steps };
        nvs.save_mash_profile(&profile).unwrap();
        assert_eq!(nvs.load_mash_profile().unwrap(), profile);
    }
}
