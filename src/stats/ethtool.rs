//! Driver statistics via the `SIOCETHTOOL` ioctl.
//!
//! Reading stats takes three requests against one control socket:
//! `ETHTOOL_GDRVINFO` for the counter count, `ETHTOOL_GSTRINGS` for the
//! names in the `ETH_SS_STATS` string set, and `ETHTOOL_GSTATS` for the
//! values. Names and values are positionally matched.
//!
//! The kernel ignores the length a caller puts in the GSTRINGS and GSTATS
//! headers and writes however many entries the driver currently reports.
//! Both buffers are therefore allocated with `COUNTER_HEADROOM` spare
//! entries, and a reply whose count differs from GDRVINFO's is rejected.

use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

use tracing::trace;

use crate::error::StatsError;
use crate::stats::{Counters, StatsProvider};

const SIOCETHTOOL: u64 = 0x8946;

const ETHTOOL_GDRVINFO: u32 = 0x0000_0003;
const ETHTOOL_GSTRINGS: u32 = 0x0000_001b;
const ETHTOOL_GSTATS: u32 = 0x0000_001d;

const ETH_SS_STATS: u32 = 1;
const ETH_GSTRING_LEN: usize = 32;
const IFNAMSIZ: usize = 16;

/// Spare entries allocated past the GDRVINFO count.
const COUNTER_HEADROOM: usize = 64;

/// `struct ifreq` restricted to the `ifr_data` member of its union.
#[allow(dead_code)]
#[repr(C)]
struct IfReq {
    ifr_name: [libc::c_char; IFNAMSIZ],
    ifr_data: *mut libc::c_void,
    _pad: [u8; 16],
}

/// `struct ethtool_drvinfo`.
#[allow(dead_code)]
#[repr(C)]
#[derive(Default)]
struct DrvInfo {
    cmd: u32,
    driver: [u8; 32],
    version: [u8; 32],
    fw_version: [u8; 32],
    bus_info: [u8; 32],
    erom_version: [u8; 32],
    reserved2: [u8; 12],
    n_priv_flags: u32,
    n_stats: u32,
    testinfo_len: u32,
    eedump_len: u32,
    regdump_len: u32,
}

/// Stats provider backed by the kernel ethtool interface.
#[derive(Debug)]
pub struct EthtoolStats {
    socket: OwnedFd,
}

impl EthtoolStats {
    /// Opens the control socket used for all subsequent queries.
    pub fn new() -> Result<Self, StatsError> {
        // SAFETY: plain socket(2) call, the returned descriptor is checked below.
        let fd = unsafe {
            libc::socket(
                libc::AF_INET,
                libc::SOCK_DGRAM | libc::SOCK_CLOEXEC,
                0,
            )
        };
        if fd < 0 {
            return Err(StatsError::Init(io::Error::last_os_error()));
        }
        // SAFETY: fd is a freshly created descriptor owned by nobody else.
        let socket = unsafe { OwnedFd::from_raw_fd(fd) };
        Ok(Self { socket })
    }

    fn ioctl(
        &self,
        interface: &str,
        op: &'static str,
        data: *mut libc::c_void,
    ) -> Result<(), StatsError> {
        let mut req = IfReq {
            ifr_name: interface_name(interface)?,
            ifr_data: data,
            _pad: [0; 16],
        };

        // SAFETY: req is a valid ifreq and both it and ifr_data outlive the call.
        // ifr_data is sized for the command in its first word. For GSTRINGS and
        // GSTATS the kernel writes its current count regardless of the header,
        // so those buffers carry COUNTER_HEADROOM spare entries; a driver that
        // grows by more than that between GDRVINFO and this call would overrun.
        let rc = unsafe {
            libc::ioctl(
                self.socket.as_raw_fd(),
                SIOCETHTOOL as _,
                &mut req as *mut IfReq,
            )
        };
        if rc < 0 {
            return Err(StatsError::Ioctl {
                interface: interface.to_string(),
                op,
                source: io::Error::last_os_error(),
            });
        }
        Ok(())
    }

    fn counter_count(&self, interface: &str) -> Result<usize, StatsError> {
        let mut info = DrvInfo {
            cmd: ETHTOOL_GDRVINFO,
            ..DrvInfo::default()
        };
        self.ioctl(
            interface,
            "ETHTOOL_GDRVINFO",
            (&mut info as *mut DrvInfo).cast(),
        )?;
        Ok(info.n_stats as usize)
    }

    fn counter_names(&self, interface: &str, count: usize) -> Result<Vec<String>, StatsError> {
        const WORDS_PER_STRING: usize = ETH_GSTRING_LEN / 4;

        // struct ethtool_gstrings { cmd, string_set, len, data[] }
        let mut buf = vec![0u32; 3 + capacity(count) * WORDS_PER_STRING];
        buf[0] = ETHTOOL_GSTRINGS;
        buf[1] = ETH_SS_STATS;
        buf[2] = count as u32;
        self.ioctl(interface, "ETHTOOL_GSTRINGS", buf.as_mut_ptr().cast())?;

        let returned = check_count(interface, count, buf[2] as usize)?;
        let bytes: Vec<u8> = buf[3..].iter().flat_map(|w| w.to_ne_bytes()).collect();

        Ok(bytes
            .chunks_exact(ETH_GSTRING_LEN)
            .take(returned)
            .map(|raw| {
                let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
                String::from_utf8_lossy(&raw[..end]).into_owned()
            })
            .collect())
    }

    fn counter_values(&self, interface: &str, count: usize) -> Result<Vec<u64>, StatsError> {
        // struct ethtool_stats { cmd, n_stats, data[] }
        let mut header = [0u8; 8];
        header[..4].copy_from_slice(&ETHTOOL_GSTATS.to_ne_bytes());
        header[4..].copy_from_slice(&(count as u32).to_ne_bytes());

        let mut buf = vec![0u64; 1 + capacity(count)];
        buf[0] = u64::from_ne_bytes(header);
        self.ioctl(interface, "ETHTOOL_GSTATS", buf.as_mut_ptr().cast())?;

        let returned_bytes = buf[0].to_ne_bytes();
        let returned = u32::from_ne_bytes([
            returned_bytes[4],
            returned_bytes[5],
            returned_bytes[6],
            returned_bytes[7],
        ]) as usize;

        let returned = check_count(interface, count, returned)?;
        Ok(buf[1..1 + returned].to_vec())
    }
}

impl StatsProvider for EthtoolStats {
    fn interface_stats(&self, interface: &str) -> Result<Counters, StatsError> {
        let count = self.counter_count(interface)?;
        if count == 0 {
            trace!("{} exposes no driver counters", interface);
            return Ok(Counters::new());
        }

        let names = self.counter_names(interface, count)?;
        let values = self.counter_values(interface, count)?;
        trace!(
            "{}: {} counter names, {} values",
            interface,
            names.len(),
            values.len()
        );

        Ok(names.into_iter().zip(values).collect())
    }
}

/// Number of entries to allocate for a reply expected to hold `count`.
fn capacity(count: usize) -> usize {
    count + COUNTER_HEADROOM
}

/// Rejects a reply whose entry count differs from the GDRVINFO count.
fn check_count(interface: &str, expected: usize, actual: usize) -> Result<usize, StatsError> {
    if actual != expected {
        return Err(StatsError::CounterSetChanged {
            interface: interface.to_string(),
            expected,
            actual,
        });
    }
    Ok(actual)
}

/// Copies an interface name into a NUL-terminated `ifr_name`.
fn interface_name(interface: &str) -> Result<[libc::c_char; IFNAMSIZ], StatsError> {
    let bytes = interface.as_bytes();
    if bytes.is_empty() || bytes.len() >= IFNAMSIZ || bytes.contains(&0) {
        return Err(StatsError::InvalidInterface(interface.to_string()));
    }

    let mut name = [0 as libc::c_char; IFNAMSIZ];
    for (dst, &src) in name.iter_mut().zip(bytes) {
        *dst = src as libc::c_char;
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_ifreq_layout_matches_kernel() {
        assert_eq!(std::mem::size_of::<IfReq>(), 40);
        assert_eq!(std::mem::size_of::<DrvInfo>(), 196);
    }

    #[test]
    fn test_interface_name_copy() {
        let name = interface_name("eth0").unwrap();
        assert_eq!(name[0] as u8, b'e');
        assert_eq!(name[3] as u8, b'0');
        assert_eq!(name[4], 0);
    }

    #[test]
    fn test_interface_name_rejects_invalid() {
        assert!(interface_name("").is_err());
        assert!(interface_name("a-very-long-name0").is_err());
        assert!(interface_name("eth\00").is_err());
        assert!(interface_name("fifteen-chars-x").is_ok());
    }

    #[test]
    fn test_reply_buffers_have_headroom() {
        assert_eq!(capacity(0), COUNTER_HEADROOM);
        assert_eq!(capacity(120), 120 + COUNTER_HEADROOM);
    }

    #[test]
    fn test_check_count_accepts_matching_reply() {
        assert_eq!(check_count("eth0", 42, 42).unwrap(), 42);
    }

    #[test]
    fn test_check_count_rejects_changed_counter_set() {
        let err = check_count("eth0", 42, 48).unwrap_err();
        assert!(matches!(
            err,
            StatsError::CounterSetChanged {
                expected: 42,
                actual: 48,
                ..
            }
        ));
        assert_eq!(err.to_string(), "eth0: driver reported 48 counters, expected 42");

        assert!(check_count("eth0", 42, 40).is_err());
    }

    #[test]
    fn test_unknown_interface_is_error() {
        let stats = EthtoolStats::new().unwrap();
        let err = stats.interface_stats("nosuchdev0").unwrap_err();
        assert!(matches!(
            err,
            StatsError::Ioctl {
                op: "ETHTOOL_GDRVINFO",
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_interface_is_rejected_before_ioctl() {
        let stats = EthtoolStats::new().unwrap();
        let err = stats.interface_stats("").unwrap_err();
        assert!(matches!(err, StatsError::InvalidInterface(_)));
    }
}
