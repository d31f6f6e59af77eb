use chrono::{DateTime, Utc};

use super::measurement::{percentage, MeasurementError, OracleExadataMeasurement};
use super::to_upper_level_layers;
use crate::model::{self, OracleExadataDatabase, OracleExadataGridDisk, OracleExadataRdma};

#[derive(Debug, Clone, PartialEq)]
pub struct OracleExadataVm {
    pub r#type: String,
    pub physical_host: String,
    pub status: String,
    pub name: String,
    pub cpu_current: i64,
    pub cpu_restart: i64,
    pub ram_current: OracleExadataMeasurement,
    pub ram_restart: OracleExadataMeasurement,
    pub cpu_online: i64,
    pub cpu_max_usable: i64,
    pub ram_online: OracleExadataMeasurement,
    pub ram_max_usable: OracleExadataMeasurement,
    pub cluster_name: String,
}

impl OracleExadataVm {
    /// Only KVM and XEN guests consume resources of their host.
    pub fn is_guest(&self) -> bool {
        self.r#type == model::VM_KVM || self.r#type == model::VM_XEN
    }
}

impl TryFrom<&model::OracleExadataVm> for OracleExadataVm {
    type Error = MeasurementError;

    fn try_from(m: &model::OracleExadataVm) -> Result<Self, Self::Error> {
        Ok(Self {
            r#type: m.r#type.clone(),
            physical_host: m.physical_host.clone(),
            status: m.status.clone(),
            name: m.name.clone(),
            cpu_current: m.cpu_current,
            cpu_restart: m.cpu_restart,
            ram_current: OracleExadataMeasurement::from_int(m.ram_current, "GB")?,
            ram_restart: OracleExadataMeasurement::from_int(m.ram_restart, "GB")?,
            cpu_online: m.cpu_online,
            cpu_max_usable: m.cpu_max_usable,
            ram_online: OracleExadataMeasurement::from_int(m.ram_online, "GB")?,
            ram_max_usable: OracleExadataMeasurement::from_int(m.ram_max_usable, "GB")?,
            cluster_name: m.cluster_name.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OracleExadataStorageCell {
    pub r#type: String,
    pub hostname: String,
    pub cell_disk: String,
    pub cell: String,
    pub size: OracleExadataMeasurement,
    pub free_space: OracleExadataMeasurement,
    pub status: String,
    pub error_count: i64,
    pub grid_disks: Vec<OracleExadataGridDisk>,
    pub databases: Vec<OracleExadataDatabase>,
}

impl TryFrom<&model::OracleExadataStorageCell> for OracleExadataStorageCell {
    type Error = MeasurementError;

    fn try_from(m: &model::OracleExadataStorageCell) -> Result<Self, Self::Error> {
        Ok(Self {
            r#type: m.r#type.clone(),
            hostname: m.hostname.clone(),
            cell_disk: m.cell_disk.clone(),
            cell: m.cell.clone(),
            size: m.size.parse()?,
            free_space: m.free_space.parse()?,
            status: m.status.clone(),
            error_count: m.error_count,
            grid_disks: m.grid_disks.clone(),
            databases: m.databases.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OracleExadataComponent {
    pub rack_id: String,
    pub host_type: String,
    pub hostname: String,
    pub host_id: String,
    pub cpu_enabled: i64,
    pub total_cpu: i64,
    pub memory: OracleExadataMeasurement,
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

    pub used_ram: OracleExadataMeasurement,
    pub free_ram: OracleExadataMeasurement,
    pub used_ram_percentage: String,

    pub used_cpu: i64,
    pub free_cpu: i64,
    pub used_cpu_percentage: String,

    pub total_size: OracleExadataMeasurement,
    pub total_free_space: OracleExadataMeasurement,
    pub used_size_percentage: String,
}

impl OracleExadataComponent {
    fn is_virtualization_host(&self) -> bool {
        self.host_type == model::DOM0 || self.host_type == model::KVM_HOST
    }
}

/// `"{used*100/total}%"` with integer division, `"0%"` for no CPUs.
fn used_cpu_percentage(used: i64, total: i64) -> String {
    if total != 0 {
        format!("{}%", used * 100 / total)
    } else {
        "0%".to_string()
    }
}

/// Copies quantity and symbol only, so the copy is never `UNKNOWN`.
fn detached(m: &OracleExadataMeasurement) -> OracleExadataMeasurement {
    let mut res = OracleExadataMeasurement::new();
    res.symbol = m.symbol.clone();
    res.quantity = m.quantity;
    res
}

impl TryFrom<&model::OracleExadataComponent> for OracleExadataComponent {
    type Error = MeasurementError;

    fn try_from(m: &model::OracleExadataComponent) -> Result<Self, Self::Error> {
        let mut res = Self {
            rack_id: m.rack_id.clone(),
            host_type: m.host_type.clone(),
            hostname: m.hostname.clone(),
            host_id: m.host_id.clone(),
            cpu_enabled: m.cpu_enabled,
            total_cpu: m.total_cpu,
            memory: OracleExadataMeasurement::from_int(m.memory, "GB")?,
            image_version: m.image_version.clone(),
            kernel: m.kernel.clone(),
            model: m.model.clone(),
            fan_used: m.fan_used,
            fan_total: m.fan_total,
            psu_used: m.psu_used,
            psu_total: m.psu_total,
            ms_status: m.ms_status.clone(),
            rs_status: m.rs_status.clone(),
            cell_service_status: m.cell_service_status.clone(),
            sw_version: m.sw_version.clone(),
            vms: to_upper_level_layers(&m.vms, |vm| OracleExadataVm::try_from(vm))?,
            storage_cells: to_upper_level_layers(&m.storage_cells, |sc| OracleExadataStorageCell::try_from(sc))?,
            cluster_names: m.cluster_names.clone(),
            used_ram: OracleExadataMeasurement::new(),
            free_ram: OracleExadataMeasurement::new(),
            used_ram_percentage: String::new(),
            used_cpu: 0,
            free_cpu: 0,
            used_cpu_percentage: String::new(),
            total_size: OracleExadataMeasurement::new(),
            total_free_space: OracleExadataMeasurement::new(),
            used_size_percentage: String::new(),
        };

        for vm in res.vms.iter().filter(|vm| vm.is_guest()) {
            res.used_ram.add_measurement(&vm.ram_current);
            res.used_ram.add_measurement(&vm.ram_online);
            res.used_cpu += vm.cpu_current + vm.cpu_online;
        }

        if res.is_virtualization_host() {
            let mut free_ram = detached(&res.memory);
            free_ram.sub(&res.used_ram);
            res.free_ram = free_ram;
            res.free_cpu = res.total_cpu - res.used_cpu;
        }

        if res.host_type == model::BARE_METAL {
            res.used_cpu += m.cpu_enabled;
        }

        for sc in &res.storage_cells {
            res.total_size.add_measurement(&sc.size);
            res.total_free_space.add_measurement(&sc.free_space);
        }

        let mut used_size = detached(&res.total_size);
        used_size.sub(&res.total_free_space);
        res.used_size_percentage = percentage(&used_size, &res.total_size);
        res.used_cpu_percentage = used_cpu_percentage(res.used_cpu, res.total_cpu);
        res.used_ram_percentage = percentage(&res.used_ram, &res.memory);

        Ok(res)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OracleExadataInstance {
    pub hostname: String,
    pub environment: String,
    pub location: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub rack_id: String,
    pub hidden: bool,
    pub components: Vec<OracleExadataComponent>,
    pub rdma: Option<OracleExadataRdma>,

    pub total_memory: OracleExadataMeasurement,
    pub used_memory: OracleExadataMeasurement,
    pub free_memory: OracleExadataMeasurement,
    pub used_memory_percentage: String,

    pub total_cpu: i64,
    pub used_cpu: i64,
    pub free_cpu: i64,
    pub used_cpu_percentage: String,

    pub total_size: OracleExadataMeasurement,
    pub used_size: OracleExadataMeasurement,
    pub free_space: OracleExadataMeasurement,
    pub used_size_percentage: String,
}

impl TryFrom<&model::OracleExadataInstance> for OracleExadataInstance {
    type Error = MeasurementError;

    fn try_from(m: &model::OracleExadataInstance) -> Result<Self, Self::Error> {
        let components = to_upper_level_layers(&m.components, |c| OracleExadataComponent::try_from(c))?;

        let mut total_memory = OracleExadataMeasurement::new();
        let mut used_memory = OracleExadataMeasurement::new();
        let mut total_size = OracleExadataMeasurement::new();
        let mut free_space = OracleExadataMeasurement::new();
        let mut total_cpu = 0;
        let mut used_cpu = 0;

        for c in &components {
            if c.host_type != model::STORAGE_CELL {
                total_memory.add_measurement(&c.memory);
                total_cpu += c.total_cpu;
            }

            if c.host_type == model::BARE_METAL {
                used_cpu += c.cpu_enabled;
            }

            if c.is_virtualization_host() {
                for vm in c.vms.iter().filter(|vm| vm.is_guest()) {
                    used_memory.add_measurement(&vm.ram_current);
                    used_memory.add_measurement(&vm.ram_online);
                    used_cpu += vm.cpu_current + vm.cpu_online;
                }
            }

            total_size.add_measurement(&c.total_size);
            free_space.add_measurement(&c.total_free_space);
        }

        let mut free_memory = detached(&total_memory);
        free_memory.sub(&used_memory);

        let mut used_size = detached(&total_size);
        used_size.sub(&free_space);

        Ok(Self {
            hostname: m.hostname.clone(),
            environment: m.environment.clone(),
            location: m.location.clone(),
            created_at: m.created_at,
            updated_at: m.updated_at,
            rack_id: m.rack_id.clone(),
            hidden: m.hidden,
            rdma: m.rdma.clone(),
            used_memory_percentage: percentage(&used_memory, &total_memory),
            used_cpu_percentage: used_cpu_percentage(used_cpu, total_cpu),
            used_size_percentage: percentage(&used_size, &total_size),
            free_cpu: total_cpu - used_cpu,
            components,
            total_memory,
            used_memory,
            free_memory,
            total_cpu,
            used_cpu,
            total_size,
            used_size,
            free_space,
        })
    }
}
