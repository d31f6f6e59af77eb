use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DOM0: &str = "DOM0";
pub const KVM_HOST: &str = "KVM_HOST";
pub const BARE_METAL: &str = "BARE_METAL";
pub const STORAGE_CELL: &str = "STORAGE_CELL";
pub const IBSWITCH: &str = "IBSWITCH";

pub const VM_KVM: &str = "VM_KVM";
pub const VM_XEN: &str = "VM_XEN";

/// An Exadata rack as stored, one document per rack id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OracleExadataInstance {
    #[serde(rename = "rackID")]
    pub rack_id: String,
    pub hostname: String,
    pub environment: String,
    pub location: String,
    pub hidden: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub rdma: Option<OracleExadataRdma>,
    pub components: Vec<OracleExadataComponent>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OracleExadataComponent {
    #[serde(rename = "rackID")]
    pub rack_id: String,
    pub host_type: String,
    pub hostname: String,
    #[serde(rename = "hostID")]
    pub host_id: String,
    pub cpu_enabled: i64,
    #[serde(rename = "totalCPU")]
    pub total_cpu: i64,
    /// GB
    pub memory: i64,
    pub image_version: String,
    pub kernel: String,
    pub model: String,
    pub fan_used: i64,
    pub fan_total: i64,
    pub psu_used: i64,
    pub psu_total: i64,
    pub ms_status: String,
    pub rs_status: String,
    pub cell_service_status: String,
    pub sw_version: String,
    pub vms: Vec<OracleExadataVm>,
    pub storage_cells: Vec<OracleExadataStorageCell>,
    pub cluster_names: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OracleExadataVm {
    pub r#type: String,
    pub physical_host: String,
    pub status: String,
    pub name: String,
    pub cpu_current: i64,
    pub cpu_restart: i64,
    /// GB
    pub ram_current: i64,
    /// GB
    pub ram_restart: i64,
    pub cpu_online: i64,
    pub cpu_max_usable: i64,
    /// GB
    pub ram_online: i64,
    /// GB
    pub ram_max_usable: i64,
    pub cluster_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OracleExadataStorageCell {
    pub r#type: String,
    pub hostname: String,
    pub cell_disk: String,
    pub cell: String,
    /// Size with unit, e.g. `"12.5 TB"`, or `UNKNOWN`.
    pub size: String,
    pub free_space: String,
    pub status: String,
    pub error_count: i64,
    pub grid_disks: Vec<OracleExadataGridDisk>,
    pub databases: Vec<OracleExadataDatabase>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OracleExadataGridDisk {
    pub r#type: String,
    pub grid_disk: String,
    pub cell_disk: String,
    pub size: String,
    pub status: String,
    pub error_count: i64,
    pub caching_policy: String,
    pub asm_disk_name: String,
    pub asm_disk_group_name: String,
    pub asm_disk_size: String,
    pub asm_disk_status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OracleExadataDatabase {
    pub r#type: String,
    pub db_name: String,
    pub cell: String,
    #[serde(rename = "dbID")]
    pub db_id: i64,
    pub flash_cache_limit: i64,
    pub iorm_share: i64,
    pub last_iorm_updated: Option<DateTime<Utc>>,
}

/// RDMA network settings assigned by users to a rack.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OracleExadataRdma {
    pub ping_infiniband: bool,
    pub ping_rdma: bool,
    pub net_mask: String,
    pub ip_addresses: Vec<String>,
}

impl OracleExadataInstance {
    pub fn component_mut(&mut self, host_id: &str) -> Option<&mut OracleExadataComponent> {
        self.components.iter_mut().find(|c| c.host_id == host_id)
    }
}

impl OracleExadataComponent {
    pub fn vm_mut(&mut self, name: &str) -> Option<&mut OracleExadataVm> {
        self.vms.iter_mut().find(|vm| vm.name == name)
    }
}
