//! CRUD for the reference entities assets hang off: departments,
//! employees, suppliers, locations and the category tree.
//!
//! Every write emits `ReferenceChanged` so the summary cache gets evicted;
//! the active/disposed id lists are untouched by reference writes.

use std::sync::Arc;

use chrono::NaiveDate;
use sea_orm::{ActiveModelTrait, EntityTrait, NotSet, PaginatorTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::{department, employee, location, major_category, minor_category, supplier};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

/// One page of reference rows.
#[derive(Debug, Serialize)]
pub struct ReferencePage<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

#[derive(Clone)]
pub struct ReferenceDataService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

/// get/list/delete are shape-identical across the reference entities;
/// create/update differ per DTO and are written out below.
macro_rules! reference_ops {
    ($get:ident, $list:ident, $delete:ident, $module:ident, $kind:expr, $label:expr) => {
        #[instrument(skip(self))]
        pub async fn $get(&self, id: i64) -> Result<$module::Model, ServiceError> {
            $module::Entity::find_by_id(id)
                .one(self.db.as_ref())
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("{} {} not found", $label, id)))
        }

        #[instrument(skip(self))]
        pub async fn $list(
            &self,
            page: u64,
            per_page: u64,
        ) -> Result<ReferencePage<$module::Model>, ServiceError> {
            let paginator = $module::Entity::find()
                .order_by_asc($module::Column::Id)
                .paginate(self.db.as_ref(), per_page);
            let total = paginator.num_items().await?;
            let items = paginator.fetch_page(page.saturating_sub(1)).await?;
            Ok(ReferencePage {
                items,
                total,
                page,
                per_page,
            })
        }

        #[instrument(skip(self))]
        pub async fn $delete(&self, id: i64) -> Result<(), ServiceError> {
            let result = $module::Entity::delete_by_id(id)
                .exec(self.db.as_ref())
                .await?;
            if result.rows_affected == 0 {
                return Err(ServiceError::NotFound(format!(
                    "{} {} not found",
                    $label, id
                )));
            }
            self.changed($kind, id).await;
            Ok(())
        }
    };
}

impl ReferenceDataService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    async fn changed(&self, kind: crate::events::ReferenceKind, id: i64) {
        self.event_sender
            .send(Event::ReferenceChanged { kind, id })
            .await;
    }

    reference_ops!(
        get_department,
        list_departments,
        delete_department,
        department,
        crate::events::ReferenceKind::Department,
        "Department"
    );
    reference_ops!(
        get_employee,
        list_employees,
        delete_employee,
        employee,
        crate::events::ReferenceKind::Employee,
        "Employee"
    );
    reference_ops!(
        get_supplier,
        list_suppliers,
        delete_supplier,
        supplier,
        crate::events::ReferenceKind::Supplier,
        "Supplier"
    );
    reference_ops!(
        get_location,
        list_locations,
        delete_location,
        location,
        crate::events::ReferenceKind::Location,
        "Location"
    );
    reference_ops!(
        get_major_category,
        list_major_categories,
        delete_major_category,
        major_category,
        crate::events::ReferenceKind::MajorCategory,
        "Major category"
    );
    reference_ops!(
        get_minor_category,
        list_minor_categories,
        delete_minor_category,
        minor_category,
        crate::events::ReferenceKind::MinorCategory,
        "Minor category"
    );

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_department(
        &self,
        request: CreateDepartmentRequest,
    ) -> Result<department::Model, ServiceError> {
        request.validate()?;
        let created = department::ActiveModel {
            id: NotSet,
            name: Set(request.name),
            department_code: Set(request.department_code),
            manager_id: Set(request.manager_id),
            description: Set(request.description),
        }
        .insert(self.db.as_ref())
        .await?;
        self.changed(crate::events::ReferenceKind::Department, created.id)
            .await;
        Ok(created)
    }

    #[instrument(skip(self, request))]
    pub async fn update_department(
        &self,
        id: i64,
        request: UpdateDepartmentRequest,
    ) -> Result<department::Model, ServiceError> {
        request.validate()?;
        let existing = self.get_department(id).await?;
        let mut active: department::ActiveModel = existing.clone().into();
        active.name = Set(request.name.unwrap_or(existing.name));
        active.department_code = Set(request.department_code.unwrap_or(existing.department_code));
        active.manager_id = Set(request.manager_id.or(existing.manager_id));
        active.description = Set(request.description.or(existing.description));
        let updated = active.update(self.db.as_ref()).await?;
        self.changed(crate::events::ReferenceKind::Department, updated.id)
            .await;
        Ok(updated)
    }

    #[instrument(skip(self, request), fields(employee_number = %request.employee_number))]
    pub async fn create_employee(
        &self,
        request: CreateEmployeeRequest,
    ) -> Result<employee::Model, ServiceError> {
        request.validate()?;
        let created = employee::ActiveModel {
            id: NotSet,
            first_name: Set(request.first_name),
            middle_name: Set(request.middle_name),
            last_name: Set(request.last_name),
            employee_number: Set(request.employee_number),
            email: Set(request.email),
            mobile_number: Set(request.mobile_number),
            job_title: Set(request.job_title),
            date_of_birth: Set(request.date_of_birth),
            date_hired: Set(request.date_hired),
            address: Set(request.address),
            department_id: Set(request.department_id),
        }
        .insert(self.db.as_ref())
        .await?;
        self.changed(crate::events::ReferenceKind::Employee, created.id)
            .await;
        Ok(created)
    }

    #[instrument(skip(self, request))]
    pub async fn update_employee(
        &self,
        id: i64,
        request: UpdateEmployeeRequest,
    ) -> Result<employee::Model, ServiceError> {
        request.validate()?;
        let existing = self.get_employee(id).await?;
        let mut active: employee::ActiveModel = existing.clone().into();
        active.first_name = Set(request.first_name.unwrap_or(existing.first_name));
        active.middle_name = Set(request.middle_name.or(existing.middle_name));
        active.last_name = Set(request.last_name.unwrap_or(existing.last_name));
        active.employee_number = Set(request.employee_number.unwrap_or(existing.employee_number));
        active.email = Set(request.email.unwrap_or(existing.email));
        active.mobile_number = Set(request.mobile_number.unwrap_or(existing.mobile_number));
        active.job_title = Set(request.job_title.unwrap_or(existing.job_title));
        active.date_of_birth = Set(request.date_of_birth.unwrap_or(existing.date_of_birth));
        active.date_hired = Set(request.date_hired.unwrap_or(existing.date_hired));
        active.address = Set(request.address.unwrap_or(existing.address));
        active.department_id = Set(request.department_id.unwrap_or(existing.department_id));
        let updated = active.update(self.db.as_ref()).await?;
        self.changed(crate::events::ReferenceKind::Employee, updated.id)
            .await;
        Ok(updated)
    }

    #[instrument(skip(self, request), fields(supplier_code = %request.supplier_code))]
    pub async fn create_supplier(
        &self,
        request: CreateSupplierRequest,
    ) -> Result<supplier::Model, ServiceError> {
        request.validate()?;
        let created = supplier::ActiveModel {
            id: NotSet,
            name: Set(request.name),
            supplier_code: Set(request.supplier_code),
            contact_person: Set(request.contact_person),
            phone_number: Set(request.phone_number),
            email: Set(request.email),
            address: Set(request.address),
            website: Set(request.website),
        }
        .insert(self.db.as_ref())
        .await?;
        self.changed(crate::events::ReferenceKind::Supplier, created.id)
            .await;
        Ok(created)
    }

    #[instrument(skip(self, request))]
    pub async fn update_supplier(
        &self,
        id: i64,
        request: UpdateSupplierRequest,
    ) -> Result<supplier::Model, ServiceError> {
        request.validate()?;
        let existing = self.get_supplier(id).await?;
        let mut active: supplier::ActiveModel = existing.clone().into();
        active.name = Set(request.name.unwrap_or(existing.name));
        active.supplier_code = Set(request.supplier_code.unwrap_or(existing.supplier_code));
        active.contact_person = Set(request.contact_person.unwrap_or(existing.contact_person));
        active.phone_number = Set(request.phone_number.unwrap_or(existing.phone_number));
        active.email = Set(request.email.unwrap_or(existing.email));
        active.address = Set(request.address.unwrap_or(existing.address));
        active.website = Set(request.website.or(existing.website));
        let updated = active.update(self.db.as_ref()).await?;
        self.changed(crate::events::ReferenceKind::Supplier, updated.id)
            .await;
        Ok(updated)
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_location(
        &self,
        request: CreateLocationRequest,
    ) -> Result<location::Model, ServiceError> {
        request.validate()?;
        let created = location::ActiveModel {
            id: NotSet,
            name: Set(request.name),
            latitude: Set(request.latitude),
            longitude: Set(request.longitude),
            use_current_location: Set(request.use_current_location),
        }
        .insert(self.db.as_ref())
        .await?;
        self.changed(crate::events::ReferenceKind::Location, created.id)
            .await;
        Ok(created)
    }

    #[instrument(skip(self, request))]
    pub async fn update_location(
        &self,
        id: i64,
        request: UpdateLocationRequest,
    ) -> Result<location::Model, ServiceError> {
        request.validate()?;
        let existing = self.get_location(id).await?;
        let mut active: location::ActiveModel = existing.clone().into();
        active.name = Set(request.name.unwrap_or(existing.name));
        active.latitude = Set(request.latitude.or(existing.latitude));
        active.longitude = Set(request.longitude.or(existing.longitude));
        active.use_current_location = Set(request
            .use_current_location
            .unwrap_or(existing.use_current_location));
        let updated = active.update(self.db.as_ref()).await?;
        self.changed(crate::events::ReferenceKind::Location, updated.id)
            .await;
        Ok(updated)
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_major_category(
        &self,
        request: CreateMajorCategoryRequest,
    ) -> Result<major_category::Model, ServiceError> {
        request.validate()?;
        let created = major_category::ActiveModel {
            id: NotSet,
            name: Set(request.name),
        }
        .insert(self.db.as_ref())
        .await?;
        self.changed(crate::events::ReferenceKind::MajorCategory, created.id)
            .await;
        Ok(created)
    }

    #[instrument(skip(self, request))]
    pub async fn update_major_category(
        &self,
        id: i64,
        request: UpdateMajorCategoryRequest,
    ) -> Result<major_category::Model, ServiceError> {
        request.validate()?;
        let existing = self.get_major_category(id).await?;
        let mut active: major_category::ActiveModel = existing.clone().into();
        active.name = Set(request.name.unwrap_or(existing.name));
        let updated = active.update(self.db.as_ref()).await?;
        self.changed(crate::events::ReferenceKind::MajorCategory, updated.id)
            .await;
        Ok(updated)
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_minor_category(
        &self,
        request: CreateMinorCategoryRequest,
    ) -> Result<minor_category::Model, ServiceError> {
        request.validate()?;
        // The parent must exist; FK errors from the driver are opaque.
        self.get_major_category(request.major_category_id)
            .await
            .map_err(|_| {
                ServiceError::ValidationError(format!(
                    "Major category {} not found",
                    request.major_category_id
                ))
            })?;
        let created = minor_category::ActiveModel {
            id: NotSet,
            name: Set(request.name),
            major_category_id: Set(request.major_category_id),
        }
        .insert(self.db.as_ref())
        .await?;
        self.changed(crate::events::ReferenceKind::MinorCategory, created.id)
            .await;
        Ok(created)
    }

    #[instrument(skip(self, request))]
    pub async fn update_minor_category(
        &self,
        id: i64,
        request: UpdateMinorCategoryRequest,
    ) -> Result<minor_category::Model, ServiceError> {
        request.validate()?;
        let existing = self.get_minor_category(id).await?;
        if let Some(parent) = request.major_category_id {
            self.get_major_category(parent).await.map_err(|_| {
                ServiceError::ValidationError(format!("Major category {} not found", parent))
            })?;
        }
        let mut active: minor_category::ActiveModel = existing.clone().into();
        active.name = Set(request.name.unwrap_or(existing.name));
        active.major_category_id = Set(request
            .major_category_id
            .unwrap_or(existing.major_category_id));
        let updated = active.update(self.db.as_ref()).await?;
        self.changed(crate::events::ReferenceKind::MinorCategory, updated.id)
            .await;
        Ok(updated)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateDepartmentRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: String,
    #[validate(length(min = 1, message = "Department code cannot be empty"))]
    pub department_code: String,
    pub manager_id: Option<i64>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateDepartmentRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    #[validate(length(min = 1, message = "Department code cannot be empty"))]
    pub department_code: Option<String>,
    pub manager_id: Option<i64>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateEmployeeRequest {
    #[validate(length(min = 1, message = "First name cannot be empty"))]
    pub first_name: String,
    pub middle_name: Option<String>,
    #[validate(length(min = 1, message = "Last name cannot be empty"))]
    pub last_name: String,
    #[validate(length(min = 1, message = "Employee number cannot be empty"))]
    pub employee_number: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    pub mobile_number: String,
    pub job_title: String,
    pub date_of_birth: NaiveDate,
    pub date_hired: NaiveDate,
    pub address: String,
    pub department_id: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateEmployeeRequest {
    #[validate(length(min = 1, message = "First name cannot be empty"))]
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    #[validate(length(min = 1, message = "Last name cannot be empty"))]
    pub last_name: Option<String>,
    #[validate(length(min = 1, message = "Employee number cannot be empty"))]
    pub employee_number: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    pub mobile_number: Option<String>,
    pub job_title: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub date_hired: Option<NaiveDate>,
    pub address: Option<String>,
    pub department_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateSupplierRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: String,
    #[validate(length(min = 1, message = "Supplier code cannot be empty"))]
    pub supplier_code: String,
    pub contact_person: String,
    pub phone_number: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    pub address: String,
    pub website: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateSupplierRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    #[validate(length(min = 1, message = "Supplier code cannot be empty"))]
    pub supplier_code: Option<String>,
    pub contact_person: Option<String>,
    pub phone_number: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateLocationRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default)]
    pub use_current_location: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateLocationRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub use_current_location: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateMajorCategoryRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateMajorCategoryRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateMinorCategoryRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: String,
    pub major_category_id: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateMinorCategoryRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    pub major_category_id: Option<i64>,
}
