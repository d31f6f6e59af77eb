use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{self, to_upper_level_layers, MeasurementError, OracleExadataMeasurement};
use crate::model::{OracleExadataDatabase, OracleExadataGridDisk, OracleExadataRdma};
use crate::utils::truncate_float64;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OracleExadataInstance {
    pub hostname: String,
    pub environment: String,
    pub location: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(rename = "rackID")]
    pub rack_id: String,
    pub hidden: bool,
    pub components: Vec<OracleExadataComponent>,
    #[serde(rename = "rdma", skip_serializing_if = "Option::is_none")]
    pub rdma: Option<OracleExadataRdma>,

    pub total_memory: i64,
    pub used_memory: i64,
    pub free_memory: i64,
    pub used_memory_percentage: String,

    #[serde(rename = "totalCPU")]
    pub total_cpu: i64,
    #[serde(rename = "usedCPU")]
    pub used_cpu: i64,
    #[serde(rename = "freeCPU")]
    pub free_cpu: i64,
    #[serde(rename = "usedCPUPercentage")]
    pub used_cpu_percentage: String,

    pub total_size: i64,
    pub used_size: i64,
    pub free_space: i64,
    pub used_size_percentage: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
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
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub vms: Vec<OracleExadataVm>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub storage_cells: Vec<OracleExadataStorageCell>,
    pub cluster_names: Vec<String>,

    #[serde(rename = "usedRAM")]
    pub used_ram: i64,
    #[serde(rename = "freeRAM")]
    pub free_ram: i64,
    #[serde(rename = "usedRAMPercentage")]
    pub used_ram_percentage: String,

    #[serde(rename = "usedCPU")]
    pub used_cpu: i64,
    #[serde(rename = "freeCPU")]
    pub free_cpu: i64,
    #[serde(rename = "usedCPUPercentage")]
    pub used_cpu_percentage: String,

    pub total_size: i64,
    pub total_free_space: i64,
    pub used_size_percentage: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OracleExadataVm {
    pub r#type: String,
    pub physical_host: String,
    pub status: String,
    pub name: String,
    pub cpu_current: i64,
    pub cpu_restart: i64,
    pub ram_current: i64,
    pub ram_restart: i64,
    pub cpu_online: i64,
    pub cpu_max_usable: i64,
    pub ram_online: i64,
    pub ram_max_usable: i64,
    pub cluster_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OracleExadataStorageCell {
    pub r#type: String,
    pub hostname: String,
    pub cell_disk: String,
    pub cell: String,
    pub size: OracleExadataMeasurement,
    pub free_space: OracleExadataMeasurement,
    pub status: String,
    pub error_count: i64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub grid_disks: Vec<OracleExadataGridDisk>,
    pub databases: Vec<OracleExadataDatabase>,
    pub free_size_percentage: f64,
}

impl TryFrom<&domain::OracleExadataInstance> for OracleExadataInstance {
    type Error = MeasurementError;

    fn try_from(d: &domain::OracleExadataInstance) -> Result<Self, Self::Error> {
        Ok(Self {
            hostname: d.hostname.clone(),
            environment: d.environment.clone(),
            location: d.location.clone(),
            created_at: d.created_at,
            updated_at: d.updated_at,
            rack_id: d.rack_id.clone(),
            hidden: d.hidden,
            components: to_upper_level_layers(&d.components, |c| OracleExadataComponent::try_from(c))?,
            rdma: d.rdma.clone(),
            total_memory: d.total_memory.rounded_gib()?,
            used_memory: d.used_memory.rounded_gib()?,
            free_memory: d.free_memory.rounded_gib()?,
            used_memory_percentage: d.used_memory_percentage.clone(),
            total_cpu: d.total_cpu,
            used_cpu: d.used_cpu,
            free_cpu: d.free_cpu,
            used_cpu_percentage: d.used_cpu_percentage.clone(),
            total_size: d.total_size.rounded_gib()?,
            used_size: d.used_size.rounded_gib()?,
            free_space: d.free_space.rounded_gib()?,
            used_size_percentage: d.used_size_percentage.clone(),
        })
    }
}

impl TryFrom<&domain::OracleExadataComponent> for OracleExadataComponent {
    type Error = MeasurementError;

    fn try_from(d: &domain::OracleExadataComponent) -> Result<Self, Self::Error> {
        Ok(Self {
            rack_id: d.rack_id.clone(),
            host_type: d.host_type.clone(),
            hostname: d.hostname.clone(),
            host_id: d.host_id.clone(),
            cpu_enabled: d.cpu_enabled,
            total_cpu: d.total_cpu,
            memory: d.memory.rounded_gib()?,
            image_version: d.image_version.clone(),
            kernel: d.kernel.clone(),
            model: d.model.clone(),
            fan_used: d.fan_used,
            fan_total: d.fan_total,
            psu_used: d.psu_used,
            psu_total: d.psu_total,
            ms_status: d.ms_status.clone(),
            rs_status: d.rs_status.clone(),
            cell_service_status: d.cell_service_status.clone(),
            sw_version: d.sw_version.clone(),
            vms: to_upper_level_layers(&d.vms, |vm| OracleExadataVm::try_from(vm))?,
            storage_cells: to_upper_level_layers(&d.storage_cells, |sc| OracleExadataStorageCell::try_from(sc))?,
            cluster_names: d.cluster_names.clone(),
            used_ram: d.used_ram.rounded_gib()?,
            free_ram: d.free_ram.rounded_gib()?,
            used_ram_percentage: d.used_ram_percentage.clone(),
            used_cpu: d.used_cpu,
            free_cpu: d.free_cpu,
            used_cpu_percentage: d.used_cpu_percentage.clone(),
            total_size: d.total_size.rounded_gib()?,
            total_free_space: d.total_free_space.rounded_gib()?,
            used_size_percentage: d.used_size_percentage.clone(),
        })
    }
}

impl TryFrom<&domain::OracleExadataVm> for OracleExadataVm {
    type Error = MeasurementError;

    fn try_from(d: &domain::OracleExadataVm) -> Result<Self, Self::Error> {
        Ok(Self {
            r#type: d.r#type.clone(),
            physical_host: d.physical_host.clone(),
            status: d.status.clone(),
            name: d.name.clone(),
            cpu_current: d.cpu_current,
            cpu_restart: d.cpu_restart,
            ram_current: d.ram_current.rounded_gib()?,
            ram_restart: d.ram_restart.rounded_gib()?,
            cpu_online: d.cpu_online,
            cpu_max_usable: d.cpu_max_usable,
            ram_online: d.ram_online.rounded_gib()?,
            ram_max_usable: d.ram_max_usable.rounded_gib()?,
            cluster_name: d.cluster_name.clone(),
        })
    }
}

/// Free space over size in TiB, truncated to two decimals. Cells with an
/// unknown or empty size report 0.
fn free_size_percentage(size: &OracleExadataMeasurement, free: &OracleExadataMeasurement) -> Result<f64, MeasurementError> {
    if size.is_unknown() || free.is_unknown() {
        return Ok(0.0);
    }
    let size = size.to_tb()?;
    let free = free.to_tb()?;
    if size.quantity == 0.0 {
        return Ok(0.0);
    }
    Ok(truncate_float64(free.quantity * 100.0 / size.quantity))
}

impl TryFrom<&domain::OracleExadataStorageCell> for OracleExadataStorageCell {
    type Error = MeasurementError;

    fn try_from(d: &domain::OracleExadataStorageCell) -> Result<Self, Self::Error> {
        Ok(Self {
            r#type: d.r#type.clone(),
            hostname: d.hostname.clone(),
            cell_disk: d.cell_disk.clone(),
            cell: d.cell.clone(),
            free_size_percentage: free_size_percentage(&d.size, &d.free_space)?,
            size: d.size.clone(),
            free_space: d.free_space.clone(),
            status: d.status.clone(),
            error_count: d.error_count,
            grid_disks: d.grid_disks.clone(),
            databases: d.databases.clone(),
        })
    }
}

/// Converts a stored rack straight into its response shape.
pub fn to_oracle_exadata_instance(m: &crate::model::OracleExadataInstance) -> Result<OracleExadataInstance, MeasurementError> {
    let d = domain::OracleExadataInstance::try_from(m)?;
    OracleExadataInstance::try_from(&d)
}
