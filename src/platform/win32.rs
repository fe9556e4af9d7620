use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tracing::{debug, info};
use windows::{
    core::{w, PCWSTR},
    Win32::{
        Foundation::{ERROR_FILE_NOT_FOUND, ERROR_PATH_NOT_FOUND, WIN32_ERROR},
        System::Registry::{
            RegDeleteKeyValueW, RegGetValueW, RegSetKeyValueW, HKEY_CURRENT_USER, REG_SZ,
            REG_VALUE_TYPE, RRF_RT_REG_SZ,
        },
        UI::Shell::{
            SHFileOperationW, FOF_ALLOWUNDO, FOF_NOCONFIRMATION, FOF_NOERRORUI, FOF_SILENT,
            FO_DELETE, SHFILEOPSTRUCTW,
        },
    },
};

use crate::menu::startup::StartupManager;

const RUN_SUBKEY: PCWSTR = w!("Software\\Microsoft\\Windows\\CurrentVersion\\Run");
const VALUE_NAME: &str = "Caprine";
const OK: WIN32_ERROR = WIN32_ERROR(0);

pub fn trash(path: &Path) -> Result<()> {
    let path_str = path
        .to_str()
        .ok_or_else(|| anyhow!("Non-UTF-8 path: {}", path.display()))?;
    // pFrom is a list terminated by an empty string.
    let mut from = wide(path_str);
    from.push(0);

    let mut op = SHFILEOPSTRUCTW {
        wFunc: FO_DELETE,
        pFrom: PCWSTR::from_raw(from.as_ptr()),
        fFlags: (FOF_ALLOWUNDO | FOF_NOCONFIRMATION | FOF_SILENT | FOF_NOERRORUI).0 as u16,
        ..Default::default()
    };

    let status = unsafe { SHFileOperationW(&mut op) };
    if status != 0 {
        return Err(anyhow!("SHFileOperationW failed ({status})"));
    }
    info!(path = %path.display(), "moved to recycle bin");
    Ok(())
}

/// Login item backed by the per-user `Run` registry key.
#[derive(Debug, Default)]
pub struct RunKey;

impl StartupManager for RunKey {
    fn is_enabled(&self) -> Result<bool> {
        Ok(read_value()?.is_some())
    }

    fn set_enabled(&self, enabled: bool) -> Result<()> {
        if enabled {
            let exe = std::env::current_exe().context("current_exe")?;
            write_value(&format!("\"{}\"", exe.display()))?;
        } else {
            delete_value()?;
        }
        debug!(enabled, "run key updated");
        Ok(())
    }
}

fn read_value() -> Result<Option<String>> {
    let value_name = wide(VALUE_NAME);
    let mut typ = REG_VALUE_TYPE::default();
    let mut bytes: u32 = 0;
    let status = unsafe {
        RegGetValueW(
            HKEY_CURRENT_USER,
            RUN_SUBKEY,
            PCWSTR::from_raw(value_name.as_ptr()),
            RRF_RT_REG_SZ,
            Some(&mut typ as *mut REG_VALUE_TYPE),
            None,
            Some(&mut bytes),
        )
    };

    if status == ERROR_FILE_NOT_FOUND {
        return Ok(None);
    }
    if status != OK {
        return Err(anyhow!("RegGetValueW(size) failed: {status:?}"));
    }

    let mut buf: Vec<u16> = vec![0u16; (bytes as usize / 2).max(1)];
    let status = unsafe {
        RegGetValueW(
            HKEY_CURRENT_USER,
            RUN_SUBKEY,
            PCWSTR::from_raw(value_name.as_ptr()),
            RRF_RT_REG_SZ,
            Some(&mut typ as *mut REG_VALUE_TYPE),
            Some(buf.as_mut_ptr() as *mut _),
            Some(&mut bytes),
        )
    };
    if status != OK {
        return Err(anyhow!("RegGetValueW(data) failed: {status:?}"));
    }

    let len = (bytes as usize / 2).saturating_sub(1);
    Ok(Some(String::from_utf16_lossy(&buf[..len])))
}

fn write_value(cmd: &str) -> Result<()> {
    let value_name = wide(VALUE_NAME);
    let cmd = wide(cmd);
    let status = unsafe {
        RegSetKeyValueW(
            HKEY_CURRENT_USER,
            RUN_SUBKEY,
            PCWSTR::from_raw(value_name.as_ptr()),
            REG_SZ.0,
            Some(cmd.as_ptr() as *const _),
            (cmd.len() * 2) as u32,
        )
    };
    if status != OK {
        return Err(anyhow!("RegSetKeyValueW failed: {status:?}"));
    }
    Ok(())
}

fn delete_value() -> Result<()> {
    let value_name = wide(VALUE_NAME);
    let status = unsafe {
        RegDeleteKeyValueW(
            HKEY_CURRENT_USER,
            RUN_SUBKEY,
            PCWSTR::from_raw(value_name.as_ptr()),
        )
    };
    if status == ERROR_FILE_NOT_FOUND || status == ERROR_PATH_NOT_FOUND {
        return Ok(());
    }
    if status != OK {
        return Err(anyhow!("RegDeleteKeyValueW failed: {status:?}"));
    }
    Ok(())
}

pub(crate) fn wide(s: &str) -> Vec<u16> {
    let mut v: Vec<u16> = s.encode_utf16().collect();
    v.push(0);
    v
}
