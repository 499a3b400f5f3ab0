use engine::{
    BlobKind, Expense, ExpenseEditForm, ExpenseForm, ExpenseId, Field, FieldErrors, Vehicle,
    VehicleEditForm, VehicleForm, VehicleId,
};

/// What submitting a form does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormKind {
    AddVehicle,
    EditVehicle(VehicleId),
    Sell(VehicleId),
    AddExpense(VehicleId),
    EditExpense(VehicleId, ExpenseId),
    Attach(VehicleId, BlobKind),
}

#[derive(Debug, Clone)]
pub struct FormField {
    pub label: &'static str,
    /// Validation key, `None` for free inputs such as a file path.
    pub field: Option<Field>,
    pub value: String,
}

impl FormField {
    fn new(label: &'static str, field: Option<Field>, value: impl Into<String>) -> Self {
        Self {
            label,
            field,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FormState {
    pub kind: FormKind,
    pub title: String,
    pub fields: Vec<FormField>,
    pub focus: usize,
    pub errors: FieldErrors,
    pub message: Option<String>,
}

impl FormState {
    fn new(kind: FormKind, title: impl Into<String>, fields: Vec<FormField>) -> Self {
        Self {
            kind,
            title: title.into(),
            fields,
            focus: 0,
            errors: FieldErrors::default(),
            message: None,
        }
    }

    pub fn add_vehicle() -> Self {
        Self::new(
            FormKind::AddVehicle,
            "Add vehicle",
            vec![
                FormField::new("Make", Some(Field::Make), ""),
                FormField::new("Model", Some(Field::Model), ""),
                FormField::new("Year", Some(Field::Year), ""),
                FormField::new("Miles", Some(Field::Miles), ""),
                FormField::new("Purchase price", Some(Field::PurchasePrice), ""),
                FormField::new("Book value", Some(Field::BookValue), ""),
                FormField::new("Color", None, ""),
                FormField::new("Notes", None, ""),
            ],
        )
    }

    pub fn edit_vehicle(vehicle: &Vehicle) -> Self {
        Self::new(
            FormKind::EditVehicle(vehicle.id.clone()),
            format!("Edit {}", vehicle.title()),
            vec![
                FormField::new("Make", Some(Field::Make), vehicle.make.as_str()),
                FormField::new("Model", Some(Field::Model), vehicle.model.as_str()),
                FormField::new("Year", Some(Field::Year), vehicle.year.to_string()),
                FormField::new("Miles", Some(Field::Miles), vehicle.miles.to_string()),
                FormField::new(
                    "Purchase price",
                    Some(Field::PurchasePrice),
                    vehicle.purchase_price.to_major_string(),
                ),
                FormField::new(
                    "Book value",
                    Some(Field::BookValue),
                    vehicle.book_value.to_major_string(),
                ),
                FormField::new("Color", None, vehicle.color.clone().unwrap_or_default()),
                FormField::new("Notes", None, vehicle.notes.clone().unwrap_or_default()),
            ],
        )
    }

    pub fn sell(vehicle: &Vehicle) -> Self {
        Self::new(
            FormKind::Sell(vehicle.id.clone()),
            format!("Sell {}", vehicle.title()),
            vec![FormField::new("Selling price", Some(Field::SellingPrice), "")],
        )
    }

    pub fn add_expense(vehicle: &Vehicle) -> Self {
        Self::new(
            FormKind::AddExpense(vehicle.id.clone()),
            format!("Expense for {}", vehicle.title()),
            vec![
                FormField::new("Description", Some(Field::Description), ""),
                FormField::new("Amount", Some(Field::Amount), ""),
                FormField::new("Date (YYYY-MM-DD, blank = today)", Some(Field::Date), ""),
            ],
        )
    }

    pub fn edit_expense(vehicle_id: &VehicleId, expense: &Expense) -> Self {
        Self::new(
            FormKind::EditExpense(vehicle_id.clone(), expense.id.clone()),
            "Edit expense",
            vec![
                FormField::new(
                    "Description",
                    Some(Field::Description),
                    expense.description.as_str(),
                ),
                FormField::new("Amount", Some(Field::Amount), expense.amount.to_major_string()),
                FormField::new(
                    "Date (YYYY-MM-DD)",
                    Some(Field::Date),
                    expense.date.format("%Y-%m-%d").to_string(),
                ),
            ],
        )
    }

    pub fn attach(vehicle: &Vehicle, kind: BlobKind) -> Self {
        let title = match kind {
            BlobKind::Image => format!("Photo for {}", vehicle.title()),
            BlobKind::Invoice => format!("Invoice for {}", vehicle.title()),
        };
        Self::new(
            FormKind::Attach(vehicle.id.clone(), kind),
            title,
            vec![FormField::new("File path", None, "")],
        )
    }

    pub fn next_field(&mut self) {
        self.focus = (self.focus + 1) % self.fields.len().max(1);
    }

    pub fn prev_field(&mut self) {
        let len = self.fields.len().max(1);
        self.focus = (self.focus + len - 1) % len;
    }

    pub fn push(&mut self, ch: char) {
        if let Some(field) = self.fields.get_mut(self.focus) {
            field.value.push(ch);
        }
    }

    pub fn pop(&mut self) {
        if let Some(field) = self.fields.get_mut(self.focus) {
            field.value.pop();
        }
    }

    /// Inline error for the row at `index`.
    pub fn error_for(&self, index: usize) -> Option<&str> {
        let field = self.fields.get(index)?.field?;
        self.errors.get(field)
    }

    /// Record a rejected submission: field errors inline, anything else as a
    /// message under the form.
    pub fn reject(&mut self, errors: Option<FieldErrors>, message: Option<String>) {
        self.errors = errors.unwrap_or_default();
        self.message = message;
        if let Some(index) = self
            .fields
            .iter()
            .position(|row| row.field.is_some_and(|f| self.errors.get(f).is_some()))
        {
            self.focus = index;
        }
    }

    pub fn value(&self, index: usize) -> &str {
        self.fields
            .get(index)
            .map(|field| field.value.as_str())
            .unwrap_or("")
    }

    pub fn vehicle_form(&self) -> VehicleForm {
        VehicleForm {
            make: self.value(0).to_string(),
            model: self.value(1).to_string(),
            year: self.value(2).to_string(),
            miles: self.value(3).to_string(),
            purchase_price: self.value(4).to_string(),
            book_value: self.value(5).to_string(),
            color: self.value(6).to_string(),
            notes: self.value(7).to_string(),
            ..Default::default()
        }
    }

    pub fn vehicle_edit_form(&self) -> VehicleEditForm {
        let value = |index: usize| Some(self.value(index).to_string());
        VehicleEditForm {
            make: value(0),
            model: value(1),
            year: value(2),
            miles: value(3),
            purchase_price: value(4),
            book_value: value(5),
            color: value(6),
            notes: value(7),
        }
    }

    pub fn expense_form(&self) -> ExpenseForm {
        ExpenseForm {
            description: self.value(0).to_string(),
            amount: self.value(1).to_string(),
            date: self.value(2).to_string(),
        }
    }

    pub fn expense_edit_form(&self) -> ExpenseEditForm {
        ExpenseEditForm {
            description: Some(self.value(0).to_string()),
            amount: Some(self.value(1).to_string()),
            date: Some(self.value(2).to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focus_wraps_both_ways() {
        let mut form = FormState::add_vehicle();
        form.prev_field();
        assert_eq!(form.focus, 7);
        form.next_field();
        assert_eq!(form.focus, 0);
    }

    #[test]
    fn rejected_form_focuses_first_bad_field() {
        let mut form = FormState::add_vehicle();
        form.focus = 6;
        let mut errors = FieldErrors::default();
        errors.push(Field::Year, "Please enter a valid year");
        errors.push(Field::PurchasePrice, "Purchase price is required");
        form.reject(Some(errors), None);

        assert_eq!(form.focus, 2);
        assert_eq!(form.error_for(2), Some("Please enter a valid year"));
        assert_eq!(form.error_for(4), Some("Purchase price is required"));
        assert_eq!(form.error_for(6), None);
    }

    #[test]
    fn typed_values_flow_into_the_vehicle_form() {
        let mut form = FormState::add_vehicle();
        for ch in "Kia".chars() {
            form.push(ch);
        }
        form.next_field();
        form.push('X');
        form.pop();
        form.push('R');

        let vehicle = form.vehicle_form();
        assert_eq!(vehicle.make, "Kia");
        assert_eq!(vehicle.model, "R");
        assert!(vehicle.book_value.is_empty());
    }
}
