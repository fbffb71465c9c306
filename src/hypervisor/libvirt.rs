//! Libvirt-backed implementation of the hypervisor traits.
//!
//! Compiled only with the `libvirt` cargo feature, since the `virt` crate
//! links against the native libvirt client library. The batched stats call
//! returns raw typed-parameter records; this module lifts them into the
//! crate's plain bundles via [`super::params`].

use std::ffi::CStr;

use virt::connect::Connect;
use virt::domain::Domain;
use virt::sys;

use super::params::{self, ParamValue};
use super::{Connection, DomainRef, DomainStatsRecord, Error, Result, StatCategories};

pub struct LibvirtConnection {
    conn: Connect,
}

// Connection objects are documented as thread-safe by libvirt; the client
// library serializes access internally.
unsafe impl Send for LibvirtConnection {}
unsafe impl Sync for LibvirtConnection {}

impl Connection for LibvirtConnection {
    type Domain = LibvirtDomain;

    fn connect(uri: &str) -> Result<Self> {
        let conn = Connect::open(Some(uri)).map_err(|err| Error::connect(uri, err))?;
        Ok(Self { conn })
    }

    fn is_alive(&self) -> Result<bool> {
        self.conn
            .is_alive()
            .map_err(|err| Error::api("virConnectIsAlive", err))
    }

    fn uri(&self) -> Result<String> {
        self.conn
            .get_uri()
            .map_err(|err| Error::api("virConnectGetURI", err))
    }

    fn driver_type(&self) -> Result<String> {
        self.conn
            .get_type()
            .map_err(|err| Error::api("virConnectGetType", err))
    }

    fn hypervisor_version(&self) -> Result<u32> {
        self.conn
            .get_hyp_version()
            .map_err(|err| Error::api("virConnectGetVersion", err))
    }

    fn library_version(&self) -> Result<u32> {
        self.conn
            .get_lib_version()
            .map_err(|err| Error::api("virConnectGetLibVersion", err))
    }

    fn all_domain_stats(
        &self,
        categories: StatCategories,
    ) -> Result<Vec<DomainStatsRecord<LibvirtDomain>>> {
        let records = self
            .conn
            .get_all_domain_stats(categories.bits(), 0)
            .map_err(|err| Error::api("virConnectGetAllDomainStats", err))?;

        Ok(records.iter().map(lift_record).collect())
    }
}

impl Drop for LibvirtConnection {
    fn drop(&mut self) {
        if let Err(err) = self.conn.close() {
            log::warn!("failed to close hypervisor connection: {err}");
        }
    }
}

pub struct LibvirtDomain {
    dom: Domain,
}

impl DomainRef for LibvirtDomain {
    fn uuid_string(&self) -> Result<String> {
        self.dom
            .get_uuid_string()
            .map_err(|err| Error::api("virDomainGetUUIDString", err))
    }

    fn metadata_xml(&self, namespace_uri: &str) -> Result<String> {
        self.dom
            .get_metadata(
                sys::VIR_DOMAIN_METADATA_ELEMENT as i32,
                Some(namespace_uri),
                sys::VIR_DOMAIN_AFFECT_LIVE,
            )
            .map_err(|err| Error::api("virDomainGetMetadata", err))
    }
}

/// Extracts the domain handle and typed parameters from one raw stats record.
fn lift_record(record: &virt::domain::DomainStatsRecord) -> DomainStatsRecord<LibvirtDomain> {
    let (domain, params) = unsafe {
        // The record list owns one reference to each domain; take our own so
        // the wrapper's drop does not invalidate the list's.
        sys::virDomainRef((*record.ptr).dom);
        let domain = Domain::from_ptr((*record.ptr).dom);
        let params = typed_params((*record.ptr).params, (*record.ptr).nparams);
        (domain, params)
    };

    DomainStatsRecord {
        domain: LibvirtDomain { dom: domain },
        stats: params::fold_params(&params),
    }
}

/// Reads a raw typed-parameter array into owned `(field, value)` pairs.
///
/// # Safety
///
/// `params` must point to at least `nparams` consecutive, initialized
/// typed-parameter entries that outlive the call.
unsafe fn typed_params(
    params: sys::virTypedParameterPtr,
    nparams: std::os::raw::c_int,
) -> Vec<(String, ParamValue)> {
    let mut out = Vec::with_capacity(nparams.max(0) as usize);

    for i in 0..nparams.max(0) as isize {
        // SAFETY: `i` is within the bounds promised by the caller; string
        // values are NUL-terminated per the typed-parameter contract.
        unsafe {
            let param = params.offset(i);
            let field = CStr::from_ptr((*param).field.as_ptr())
                .to_string_lossy()
                .into_owned();
            let value = match (*param).type_ as u32 {
                sys::VIR_TYPED_PARAM_INT => ParamValue::Int((*param).value.i as i64),
                sys::VIR_TYPED_PARAM_UINT => ParamValue::UInt((*param).value.ui as u64),
                sys::VIR_TYPED_PARAM_LLONG => ParamValue::Int((*param).value.l),
                sys::VIR_TYPED_PARAM_ULLONG => ParamValue::UInt((*param).value.ul),
                sys::VIR_TYPED_PARAM_DOUBLE => ParamValue::Double((*param).value.d),
                sys::VIR_TYPED_PARAM_BOOLEAN => ParamValue::Bool((*param).value.b != 0),
                sys::VIR_TYPED_PARAM_STRING => {
                    if (*param).value.s.is_null() {
                        continue;
                    }
                    ParamValue::Str(CStr::from_ptr((*param).value.s).to_string_lossy().into_owned())
                }
                _ => continue,
            };
            out.push((field, value));
        }
    }

    out
}
